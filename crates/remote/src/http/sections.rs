use async_trait::async_trait;
use course_core::model::SectionId;
use tracing::{debug, instrument};

use super::HttpGateway;
use super::mapping::{CompleteSectionBody, CompletionResponseDto};
use crate::gateway::{RemoteError, SectionCompletion, SectionGateway};

#[async_trait]
impl SectionGateway for HttpGateway {
    #[instrument(skip(self))]
    async fn complete_section(
        &self,
        section_id: &SectionId,
    ) -> Result<SectionCompletion, RemoteError> {
        let url = self.url(&format!("/sections/{section_id}/complete"));
        let request = self
            .client
            .post(url)
            .json(&CompleteSectionBody { is_completed: true });
        let dto: CompletionResponseDto = self.send_json(request).await?;
        let completion = dto.into_completion()?;
        debug!(
            has_progression = completion.progression.is_some(),
            has_section = completion.section.is_some(),
            "section completion acknowledged"
        );
        Ok(completion)
    }
}
