pub mod books;
pub mod buyers;
pub mod detail_orders;
pub mod orders;
pub mod products;
pub mod ratings;
pub mod users;
pub mod vouchers;

pub use books::Entity as Books;
pub use buyers::Entity as Buyers;
pub use detail_orders::Entity as DetailOrders;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use ratings::Entity as Ratings;
pub use users::Entity as Users;
pub use vouchers::Entity as Vouchers;
