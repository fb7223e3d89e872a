use uuid::Uuid;

pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub customer_id: String,
}
