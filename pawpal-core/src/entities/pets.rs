use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "pet_status")]
pub enum PetStatus {
    Available,
    Sold,
    Archived,
}

/// The slice of a marketplace listing that checkout needs.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PetListing {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub status: PetStatus,
}

#[derive(Debug, Clone)]
pub struct GetPetById {
    pub pet_id: Uuid,
}

impl Processor<GetPetById> for DatabaseProcessor {
    type Output = Option<PetListing>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetPetById")]
    async fn process(&self, query: GetPetById) -> Result<Option<PetListing>, sqlx::Error> {
        sqlx::query_as::<_, PetListing>(
            "SELECT id, seller_id, name, price, status FROM pets WHERE id = $1",
        )
        .bind(query.pet_id)
        .fetch_optional(&self.pool)
        .await
    }
}
