// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Borrowed callback state passed to the engine as an opaque pointer.

use std::os::raw::c_void;

/// Owns a heap-allocated value whose address is handed to the engine.
///
/// The engine only ever receives a borrowed pointer from [`UserData::borrow`].
/// The value lives exactly as long as this owner; the engine must not invoke a
/// callback with the pointer after the owner is dropped. Nothing checks this:
/// owners such as [`crate::Driver`] release the engine handle before their
/// `UserData`, which is what keeps the pointer valid.
#[derive(Debug)]
pub struct UserData<T> {
    value: Box<T>,
}

impl<T> UserData<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Box::new(value),
        }
    }

    /// An opaque pointer to the value. Moving `self` does not change it.
    pub fn borrow(&self) -> *mut c_void {
        &*self.value as *const T as *mut c_void
    }

    /// Recovers a reference from a pointer produced by [`UserData::borrow`].
    ///
    /// Can be called any number of times for the same pointer; it never takes ownership.
    ///
    /// # Safety
    ///
    /// `raw` must come from `borrow` on a `UserData<T>` that is still alive for `'a`.
    pub unsafe fn reconstruct<'a>(raw: *mut c_void) -> &'a T {
        unsafe { &*(raw as *const T) }
    }

    pub fn get(&self) -> &T {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn reconstruct_is_repeatable_and_non_owning() {
        let shared = Arc::new(String::from("context"));
        let capsule = UserData::new(Arc::clone(&shared));
        let raw = capsule.borrow();
        for _ in 0..1000 {
            let value = unsafe { UserData::<Arc<String>>::reconstruct(raw) };
            assert_eq!(value.as_str(), "context");
        }
        assert_eq!(Arc::strong_count(&shared), 2);
        drop(capsule);
        assert_eq!(Arc::strong_count(&shared), 1);
    }

    #[test]
    fn pointer_survives_moving_the_owner() {
        let capsule = UserData::new(42u64);
        let raw = capsule.borrow();
        let moved = vec![capsule];
        assert_eq!(moved[0].borrow(), raw);
        assert_eq!(unsafe { *UserData::<u64>::reconstruct(raw) }, 42);
        assert_eq!(*moved[0].get(), 42);
    }
}
