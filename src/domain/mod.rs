pub mod catalog;
pub mod checkout;
pub mod events;
pub mod money;
pub mod order;

pub use catalog::{CategoryGroup, DeliveryArea, Product, ProductCategory};
pub use checkout::{CreateOrderInput, CustomerInput, LineItemInput};
pub use events::OrderEvent;
pub use order::{
    Customer, CustomerSummary, DeliveryAddress, Order, OrderDetails, OrderItem, OrderPatch,
    OrderStatus, OrderTransition, PaymentRecord, PaymentStatus,
};
