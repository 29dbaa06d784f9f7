//! Research actions: the append-only output of the engine.

use serde::{Deserialize, Serialize};
use types::{
    ActionId, ActionType, AnalystId, ContentType, EventId, EventType, IdeaId, IdeaStage,
    Recommendation, SecurityId, Timestamp,
};

/// Structured content attached to an action.
///
/// Rendering text is out of scope; downstream publishers build documents
/// from these fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPayload {
    pub content_type: ContentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_target: Option<f64>,
    /// Price at action time the target was measured against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_price: Option<f64>,
    /// Idea stage after the action.
    pub stage: IdeaStage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_stage: Option<IdeaStage>,
    /// Event that triggered the action, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<EventId>,
    /// Evaluation horizon of the forecast, in days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizon_days: Option<u32>,
}

impl ContentPayload {
    pub fn new(content_type: ContentType, stage: IdeaStage) -> Self {
        Self {
            content_type,
            recommendation: None,
            target_price: None,
            previous_target: None,
            reference_price: None,
            stage,
            from_stage: None,
            trigger: None,
            horizon_days: None,
        }
    }

    /// True when the payload carries a forecast to evaluate later.
    pub fn has_forecast(&self) -> bool {
        self.target_price.is_some() && self.horizon_days.is_some()
    }
}

/// One immutable decision record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchAction {
    pub action_id: ActionId,
    pub analyst_id: AnalystId,
    pub security_id: SecurityId,
    pub idea_id: IdeaId,
    pub action_type: ActionType,
    pub timestamp: Timestamp,
    pub content_payload: ContentPayload,
    pub confidence: f64,
}

/// Content type for an action, given the triggering event if any.
pub fn content_type_for(action: ActionType, event: Option<EventType>) -> ContentType {
    match action {
        ActionType::NewIdea => ContentType::InitiationCoverage,
        ActionType::TargetPriceRevision => ContentType::CompanyModel,
        ActionType::StageTransition | ActionType::Pass | ActionType::Exit => {
            ContentType::ThesisUpdate
        }
        ActionType::Update => match event {
            Some(EventType::SectorNews) => ContentType::SectorResearch,
            Some(
                EventType::ConferenceCall | EventType::InvestorDay | EventType::ManagementChange,
            ) => ContentType::MeetingNote,
            Some(EventType::EarningsAnnouncement | EventType::GuidanceUpdate) => {
                ContentType::EarningsPreview
            }
            _ => ContentType::QuickUpdate,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_content_mapping() {
        assert_eq!(
            content_type_for(ActionType::NewIdea, None),
            ContentType::InitiationCoverage
        );
        assert_eq!(
            content_type_for(ActionType::Update, Some(EventType::SectorNews)),
            ContentType::SectorResearch
        );
        assert_eq!(
            content_type_for(ActionType::Update, Some(EventType::ConferenceCall)),
            ContentType::MeetingNote
        );
        assert_eq!(
            content_type_for(ActionType::Update, None),
            ContentType::QuickUpdate
        );
        assert_eq!(
            content_type_for(ActionType::Exit, Some(EventType::MarketMovement)),
            ContentType::ThesisUpdate
        );
    }

    #[test]
    fn test_action_json_omits_empty_fields() {
        let action = ResearchAction {
            action_id: ActionId(1),
            analyst_id: AnalystId(2),
            security_id: "SEC001".into(),
            idea_id: IdeaId::new(AnalystId(2), 1),
            action_type: ActionType::StageTransition,
            timestamp: Utc.with_ymd_and_hms(2022, 3, 1, 12, 0, 0).unwrap(),
            content_payload: ContentPayload::new(ContentType::ThesisUpdate, IdeaStage::Wip),
            confidence: 0.5,
        };
        let json = serde_json::to_string(&action).unwrap();
        assert!(!json.contains("target_price"));
        assert!(!action.content_payload.has_forecast());
        let back: ResearchAction = serde_json::from_str(&json).unwrap();
        assert_eq!(back.idea_id, action.idea_id);
    }
}
