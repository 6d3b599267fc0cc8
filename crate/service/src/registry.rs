//! The fixed pool of operation contexts and the handles that name them.
//!
//! Every context a client manipulates lives in one slot of the pool. Clients only
//! ever hold the 32-bit handle of the slot; each lookup checks the handle against
//! the slot occupancy, the expected operation kind and the slot generation before
//! granting access to the context.

use crate::{
    error::{ServiceError, result::ServiceResult},
    operation::{
        INVALID_HANDLE, MAX_OPERATION_CAPACITY, OperationContext, OperationKind, OperationVariant,
        decode_handle, encode_handle,
    },
    service_ensure,
};

#[derive(Default)]
struct OperationSlot {
    in_use: bool,
    kind: OperationKind,
    /// Bumped on every allocation of the slot; never 0 once allocated.
    generation: u16,
    context: OperationContext,
}

impl OperationSlot {
    fn matches(&self, generation: u16) -> bool {
        self.in_use && self.generation == generation
    }

    /// Overwrite the whole context with zeroes before returning the slot to the pool.
    ///
    /// The context is left as the all-zero `Empty`: no byte of a previous payload,
    /// nor of any temporary copied in, survives the release.
    #[allow(unsafe_code)]
    fn wipe(&mut self) {
        // drop the previous payload first so its owned state is released normally
        self.context = OperationContext::Empty;
        let context: *mut OperationContext = &mut self.context;
        // SAFETY: `context` points to a valid, exclusively borrowed `Empty`, which
        // owns no resource. `OperationContext` is `repr(u32)` with `Empty = 0`, so
        // the all-zero bytes written here are themselves a valid `Empty`.
        unsafe {
            zeroize::zeroize_flat_type(context);
        }
        self.kind = OperationKind::None;
        self.in_use = false;
    }
}

/// Fixed-capacity table of operation contexts.
pub struct OperationRegistry {
    slots: Box<[OperationSlot]>,
}

impl OperationRegistry {
    /// Create a registry with `capacity` free slots.
    pub fn new(capacity: usize) -> ServiceResult<Self> {
        service_ensure!(
            (1..=MAX_OPERATION_CAPACITY).contains(&capacity),
            ServiceError::Config(format!(
                "the operation capacity must be between 1 and {MAX_OPERATION_CAPACITY}, found \
                 {capacity}"
            ))
        );
        let slots = (0..capacity).map(|_| OperationSlot::default()).collect();
        Ok(Self { slots })
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots currently holding a live context.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.slots.iter().filter(|s| s.in_use).count()
    }

    /// Reserve the first free slot for an operation of `kind`.
    ///
    /// The slot receives the zeroed initial context of its kind.
    pub fn allocate(&mut self, kind: OperationKind) -> ServiceResult<u32> {
        service_ensure!(
            kind != OperationKind::None,
            ServiceError::BadParameters("cannot allocate a context without a kind".to_owned())
        );
        let capacity = self.capacity();
        let (index, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, s)| !s.in_use)
            .ok_or(ServiceError::ResourceExhausted(capacity))?;
        slot.generation = match slot.generation.wrapping_add(1) {
            0 => 1,
            g => g,
        };
        slot.in_use = true;
        slot.kind = kind;
        slot.context = OperationContext::initial(kind);
        Ok(encode_handle(index, slot.generation))
    }

    fn live_slot(&mut self, handle: u32) -> ServiceResult<&mut OperationSlot> {
        let (index, generation) =
            decode_handle(handle).ok_or(ServiceError::InvalidHandle(handle))?;
        self.slots
            .get_mut(index)
            .filter(|s| s.matches(generation))
            .ok_or(ServiceError::InvalidHandle(handle))
    }

    /// Resolve `handle` to its context, provided it was allocated for `kind`.
    pub fn lookup(
        &mut self,
        kind: OperationKind,
        handle: u32,
    ) -> ServiceResult<&mut OperationContext> {
        let slot = self.live_slot(handle)?;
        service_ensure!(slot.kind == kind, ServiceError::InvalidHandle(handle));
        Ok(&mut slot.context)
    }

    /// Typed variant of [`Self::lookup`].
    pub fn lookup_as<T: OperationVariant>(&mut self, handle: u32) -> ServiceResult<&mut T> {
        T::from_context(self.lookup(T::KIND, handle)?).ok_or(ServiceError::InvalidHandle(handle))
    }

    /// The kind recorded for a live handle.
    pub fn kind_of(&mut self, handle: u32) -> ServiceResult<OperationKind> {
        Ok(self.live_slot(handle)?.kind)
    }

    /// Wipe the context behind `handle` and return its slot to the pool.
    ///
    /// Releasing a free slot, or through a handle from an earlier allocation, fails.
    pub fn release(&mut self, handle: u32) -> ServiceResult<()> {
        service_ensure!(handle != INVALID_HANDLE, ServiceError::InvalidHandle(handle));
        self.live_slot(handle)?.wipe();
        Ok(())
    }
}
