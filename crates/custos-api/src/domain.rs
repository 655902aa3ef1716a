//! Demo shop domain: users, their addresses, and their orders.
//!
//! Three ownership styles are represented: a user owns itself, an address
//! is owned through its `user` relation, and an order carries the owner's id
//! directly in `user_id`.

use custos_acl::{
    Entity, EntityCatalog, EntityId, EntityShape, EntityType, FieldKind, FieldValue,
    InMemoryStore, LoadedEntity, OwnershipDescriptor,
};
use serde::{Deserialize, Serialize};

/// Entity type of [`User`].
pub const USER: EntityType = EntityType::new("User");
/// Entity type of [`UserAddress`].
pub const USER_ADDRESS: EntityType = EntityType::new("UserAddress");
/// Entity type of [`Order`].
pub const ORDER: EntityType = EntityType::new("Order");

// ============================================================================
// Users
// ============================================================================

/// A shop customer or administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identifier; also the caller id when this user authenticates.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Contact address.
    pub email: String,
}

impl Entity for User {
    fn shape() -> EntityShape {
        EntityShape::new(USER).identity_bearing()
    }

    fn entity_type(&self) -> EntityType {
        USER
    }

    fn id(&self) -> EntityId {
        EntityId::new(self.id)
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::Id(self.id)),
            "name" | "email" => Some(FieldValue::Scalar),
            _ => None,
        }
    }
}

// ============================================================================
// Addresses
// ============================================================================

/// A shipping address belonging to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAddress {
    /// Identifier.
    pub id: i64,
    /// Owning user.
    pub user: Option<User>,
    /// Street line.
    pub street: String,
    /// City.
    pub city: String,
}

impl Entity for UserAddress {
    fn shape() -> EntityShape {
        EntityShape::new(USER_ADDRESS)
            .field("user", FieldKind::Ref(USER))
            .field("street", FieldKind::Scalar)
            .field("city", FieldKind::Scalar)
    }

    fn entity_type(&self) -> EntityType {
        USER_ADDRESS
    }

    fn id(&self) -> EntityId {
        EntityId::new(self.id)
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::Id(self.id)),
            "user" => Some(match &self.user {
                Some(user) => FieldValue::Ref(user),
                None => FieldValue::Null,
            }),
            "street" | "city" => Some(FieldValue::Scalar),
            _ => None,
        }
    }
}

// ============================================================================
// Orders
// ============================================================================

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, not yet shipped.
    Pending,
    /// Handed to the carrier.
    Shipped,
    /// Cancelled by the customer or an admin.
    Cancelled,
}

impl OrderStatus {
    /// Whether the order can still be cancelled.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }
}

/// A customer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Identifier.
    pub id: i64,
    /// Owning user; absent for guest checkouts.
    pub user_id: Option<i64>,
    /// Current state.
    pub status: OrderStatus,
    /// Order total in cents.
    pub total_cents: i64,
}

impl Order {
    /// A copy of this order in the cancelled state.
    pub fn cancelled(&self) -> Self {
        Self {
            status: OrderStatus::Cancelled,
            ..self.clone()
        }
    }
}

impl Entity for Order {
    fn shape() -> EntityShape {
        EntityShape::new(ORDER)
            .field("user_id", FieldKind::Id)
            .field("status", FieldKind::Scalar)
            .field("total_cents", FieldKind::Scalar)
    }

    fn entity_type(&self) -> EntityType {
        ORDER
    }

    fn id(&self) -> EntityId {
        EntityId::new(self.id)
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::Id(self.id)),
            "user_id" => Some(self.user_id.map_or(FieldValue::Null, FieldValue::Id)),
            "status" | "total_cents" => Some(FieldValue::Scalar),
            _ => None,
        }
    }
}

// ============================================================================
// Catalog and seed data
// ============================================================================

/// Ownership configuration of the shop's entity types.
pub fn catalog() -> custos_acl::Result<EntityCatalog> {
    EntityCatalog::builder()
        .register::<User>(OwnershipDescriptor::owner_is_self())
        .register::<UserAddress>(OwnershipDescriptor::path("user.id"))
        .register::<Order>(OwnershipDescriptor::path("user_id"))
        .build()
}

/// Downcast a stored entity to a concrete domain type.
pub fn downcast<T: Entity + Clone>(entity: &LoadedEntity) -> Option<T> {
    entity.downcast_ref::<T>().cloned()
}

/// All orders in the store, ordered by id.
pub async fn all_orders(store: &InMemoryStore) -> Vec<Order> {
    store
        .all(ORDER)
        .await
        .into_iter()
        .filter_map(|e| downcast::<Order>(&LoadedEntity::new(e)))
        .collect()
}

/// Fetch one order from the store.
pub async fn find_order(store: &InMemoryStore, id: EntityId) -> Option<Order> {
    let entity = store.get(ORDER, id).await?;
    downcast(&LoadedEntity::new(entity))
}

fn user(id: i64, name: &str) -> User {
    User {
        id,
        name: name.to_string(),
        email: format!("{}@shoes.example", name.to_lowercase()),
    }
}

/// Populate `store` with the demo data set.
///
/// Users 1 (admin), 5 and 9; addresses 10 (user 5) and 11 (user 9); orders
/// 100 and 102 (user 5), 101 (user 9), 103 shipped (user 5) and 104 (guest).
pub async fn seed(store: &InMemoryStore) {
    let admin = user(1, "Ada");
    let alice = user(5, "Alice");
    let bob = user(9, "Bob");

    store
        .insert(UserAddress {
            id: 10,
            user: Some(alice.clone()),
            street: "1 Lace Lane".to_string(),
            city: "Portland".to_string(),
        })
        .await;
    store
        .insert(UserAddress {
            id: 11,
            user: Some(bob.clone()),
            street: "9 Heel Street".to_string(),
            city: "Boston".to_string(),
        })
        .await;

    for user in [admin, alice, bob] {
        store.insert(user).await;
    }

    let orders = [
        (100, Some(5), OrderStatus::Pending, 12_900),
        (101, Some(9), OrderStatus::Pending, 8_450),
        (102, Some(5), OrderStatus::Pending, 5_000),
        (103, Some(5), OrderStatus::Shipped, 21_000),
        (104, None, OrderStatus::Pending, 3_999),
    ];
    for (id, user_id, status, total_cents) in orders {
        store
            .insert(Order {
                id,
                user_id,
                status,
                total_cents,
            })
            .await;
    }

    log::debug!("Seeded demo store with {} records", store.len().await);
}
