use async_trait::async_trait;
use course_core::model::{CourseId, SectionId, XpPeriod, XpSnapshot};
use tracing::instrument;

use super::HttpGateway;
use super::mapping::{LevelUpBody, SectionCompletionActivityBody, XpSnapshotDto};
use crate::gateway::{ActivityGateway, RemoteError, XpHistoryGateway};

#[async_trait]
impl ActivityGateway for HttpGateway {
    #[instrument(skip(self))]
    async fn record_level_up(&self, level: u32) -> Result<(), RemoteError> {
        let request = self
            .client
            .post(self.url("/activity/level-up"))
            .json(&LevelUpBody { level });
        self.send(request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn record_section_completion(
        &self,
        course_id: &CourseId,
        section_id: &SectionId,
        xp_earned: u32,
    ) -> Result<(), RemoteError> {
        let body = SectionCompletionActivityBody {
            course_id,
            section_id,
            xp_earned,
        };
        let request = self
            .client
            .post(self.url("/activity/section-completion"))
            .json(&body);
        self.send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl XpHistoryGateway for HttpGateway {
    #[instrument(skip(self))]
    async fn fetch_xp_history(
        &self,
        period: XpPeriod,
        limit: usize,
    ) -> Result<Vec<XpSnapshot>, RemoteError> {
        let request = self
            .client
            .get(self.url("/activity/xp-history"))
            .query(&[("period", period.as_str().to_string()), ("limit", limit.to_string())]);
        let dtos: Vec<XpSnapshotDto> = self.send_json(request).await?;
        dtos.into_iter().map(XpSnapshotDto::into_snapshot).collect()
    }
}
