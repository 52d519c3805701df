use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rds_common::Fare;

use crate::{
    db_types::Owner,
    dispatch_api::dispatch_objects::{ChairSales, ModelSales, OwnerChairSummary, SalesReport},
    traits::{DispatchApiError, DispatchDatabase},
};

/// `OwnerApi` serves the owner-facing reports: the chair fleet listing and the sales report.
pub struct OwnerApi<B> {
    db: B,
}

impl<B> OwnerApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OwnerApi<B>
where B: DispatchDatabase
{
    /// Sales aggregated over the owner's completed rides in the window, by chair and by model. Every chair the
    /// owner operates appears in the report, with zero sales if it served no rides.
    pub async fn sales_report(
        &self,
        owner: &Owner,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<SalesReport, DispatchApiError> {
        let chairs = self.db.fetch_chairs_for_owner(&owner.id).await.map_err(DispatchApiError::from)?;
        let records = self.db.sales_for_owner(&owner.id, since, until).await?;

        let mut by_chair: BTreeMap<String, Fare> = chairs.iter().map(|c| (c.id.0.clone(), Fare::default())).collect();
        let mut by_model: BTreeMap<String, Fare> = BTreeMap::new();
        let mut total_sales = Fare::default();
        for record in &records {
            let sale = record.sale();
            total_sales = total_sales + sale;
            if let Some(entry) = by_chair.get_mut(record.chair_id.as_str()) {
                *entry = *entry + sale;
            }
            let model = by_model.entry(record.model.clone()).or_default();
            *model = *model + sale;
        }

        let chair_sales = chairs
            .iter()
            .map(|c| ChairSales {
                id: c.id.clone(),
                name: c.name.clone(),
                sales: by_chair.get(c.id.as_str()).copied().unwrap_or_default(),
            })
            .collect();
        let model_sales = by_model.into_iter().map(|(model, sales)| ModelSales { model, sales }).collect();
        Ok(SalesReport { total_sales, chairs: chair_sales, models: model_sales })
    }

    /// The owner's fleet with cumulative travelled distance per chair.
    pub async fn owned_chairs(&self, owner: &Owner) -> Result<Vec<OwnerChairSummary>, DispatchApiError> {
        let chairs = self.db.fetch_chairs_for_owner(&owner.id).await.map_err(DispatchApiError::from)?;
        let summaries = chairs
            .into_iter()
            .map(|c| OwnerChairSummary {
                id: c.id,
                name: c.name,
                model: c.model,
                active: c.is_active,
                registered_at: c.created_at.timestamp_millis(),
                total_distance: c.total_distance,
                total_distance_updated_at: c.total_distance_updated_at.map(|t| t.timestamp_millis()),
            })
            .collect();
        Ok(summaries)
    }
}
