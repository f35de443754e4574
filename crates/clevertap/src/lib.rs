//! CleverTap destination for the analytics pipeline: maps identify, track,
//! alias and screen calls onto the CleverTap SDK and defers lifecycle calls
//! until the SDK client is ready.

pub mod api;
pub mod charged;
pub mod destination;
pub mod handle;
pub mod profile;
pub mod queue;
pub mod testing;
pub mod utils;

pub use api::{CleverTapApi, CleverTapSdk, VendorError, VendorResult, ERROR_CODE};
pub use destination::{CleverTapDestination, CleverTapDestinationBuilder, CleverTapSettings};
pub use queue::{Dispatcher, InlineDispatcher, PendingOperations};
pub use utils::clevertap_date;
