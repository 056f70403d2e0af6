//! Application services.
//!
//! One service per collection, generic over the storage traits so they can
//! be exercised against in-memory storage in tests. The order service is
//! the orchestrator spanning all three collections.

pub mod orders;
pub mod products;
pub mod users;

pub use orders::OrderService;
pub use products::ProductService;
pub use users::UserService;
