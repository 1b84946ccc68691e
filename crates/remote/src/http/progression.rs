use async_trait::async_trait;
use course_core::model::UserProgression;
use tracing::instrument;

use super::HttpGateway;
use super::mapping::ProgressionDto;
use crate::gateway::{ProgressionGateway, RemoteError};

#[async_trait]
impl ProgressionGateway for HttpGateway {
    #[instrument(skip(self))]
    async fn fetch_progression(&self) -> Result<UserProgression, RemoteError> {
        let request = self.client.get(self.url("/profile/progression"));
        let dto: ProgressionDto = self.send_json(request).await?;
        Ok(dto.into_progression())
    }
}
