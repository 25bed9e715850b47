pub mod order;
pub mod org;
pub mod pagination;
pub mod product;
pub mod role;
pub mod user;
