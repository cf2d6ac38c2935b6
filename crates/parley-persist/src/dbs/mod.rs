pub mod memory;
#[cfg(feature = "mongodb")]
pub mod mongo;

/// Fresh collision-resistant history storage key
pub(crate) fn new_thread_key() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
