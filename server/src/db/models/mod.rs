//! Database models
//!
//! One file per aggregate, plus shared serde helpers for RecordId
//! string serialization.

pub mod serde_helpers;

pub mod delivery;
pub mod notification;
pub mod order;
pub mod payment;
pub mod product;
pub mod review;
pub mod shop;
pub mod stock;
pub mod token;
pub mod user;
pub mod wishlist;

pub use delivery::{AssignRiderPayload, Delivery, DeliveryStatus, DeliveryStatusUpdate};
pub use notification::{Notification, NotificationType};
pub use order::{
    BulkOrderStatusUpdate, BulkUpdateResult, CheckoutItem, CheckoutPayload, Order, OrderItem,
    OrderStatus, OrderStatusUpdate,
};
pub use payment::{EscrowStatus, Payment, PaymentStatus};
pub use product::{
    Category, PricingUnit, PricingUnitInput, Product, ProductCreate, ProductFull, ProductUpdate,
};
pub use review::{Review, ReviewCreate, RiderRating, RiderRatingCreate};
pub use shop::{Shop, ShopUpdate};
pub use stock::{RestockPayload, StockChange, StockChangeType, StockSetPayload};
pub use token::{OneTimeToken, TokenPurpose};
pub use user::{
    ApprovalStatus, CompleteProfilePayload, LoginPayload, RegisterPayload, Role, RoleSummary,
    User, UserProfile, UserRole,
};
pub use wishlist::{WishlistAdd, WishlistItem};
