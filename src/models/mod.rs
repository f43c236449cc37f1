pub mod audit_log;
pub mod color;
pub mod product;
pub mod product_variant;
pub mod refresh_token;
pub mod reservation;
pub mod role;
pub mod role_permission;
pub mod size;
pub mod user;

pub use reservation::ReservationStatus;
pub use user::UserDto;
