//! Resource Descriptors
//!
//! One static record per remote entity type. The proxy is driven entirely by
//! these records; routes only pick a [`ResourceKind`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::payload::{self, PayloadBuilder};
use crate::session::SessionKey;

/// Remote entity types the console manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Person,
    Event,
    Survey,
    SurveyResponse,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Person,
        ResourceKind::Event,
        ResourceKind::Survey,
        ResourceKind::SurveyResponse,
    ];

    /// The descriptor for this kind
    pub fn descriptor(self) -> &'static ResourceDescriptor {
        match self {
            ResourceKind::Person => &DESCRIPTORS[0],
            ResourceKind::Event => &DESCRIPTORS[1],
            ResourceKind::Survey => &DESCRIPTORS[2],
            ResourceKind::SurveyResponse => &DESCRIPTORS[3],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().type_name)
    }
}

/// Static configuration for one entity type
#[derive(Debug)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    /// Human-readable name used in messages and logs
    pub type_name: &'static str,
    /// Key wrapping the record in request and item response bodies
    pub envelope: &'static str,
    /// Collection path, relative to the tenant base URL
    pub list_path: &'static str,
    /// Item path; `{id}` is replaced by the remote id
    pub item_path: &'static str,
    /// Session key bound on create and cleared on delete
    pub id_key: Option<SessionKey>,
    /// Keys whose ids belong to this record; cleared along with `id_key`
    pub dependent_keys: &'static [SessionKey],
    pub create_payload: PayloadBuilder,
    pub update_payload: Option<PayloadBuilder>,
}

pub static DESCRIPTORS: [ResourceDescriptor; 4] = [
    ResourceDescriptor {
        kind: ResourceKind::Person,
        type_name: "person",
        envelope: "person",
        list_path: "/api/v1/people",
        item_path: "/api/v1/people/{id}",
        id_key: Some(SessionKey::UserId),
        dependent_keys: &[SessionKey::QuestionAnswer],
        create_payload: payload::person_create,
        update_payload: Some(payload::person_update),
    },
    ResourceDescriptor {
        kind: ResourceKind::Event,
        type_name: "event",
        envelope: "event",
        list_path: "/api/v1/sites/{site}/pages/events",
        item_path: "/api/v1/sites/{site}/pages/events/{id}",
        id_key: Some(SessionKey::EventId),
        dependent_keys: &[],
        create_payload: payload::event_create,
        update_payload: Some(payload::event_update),
    },
    ResourceDescriptor {
        kind: ResourceKind::Survey,
        type_name: "survey",
        envelope: "survey",
        list_path: "/api/v1/sites/{site}/pages/surveys",
        item_path: "/api/v1/sites/{site}/pages/surveys/{id}",
        id_key: None,
        dependent_keys: &[],
        create_payload: payload::survey_create,
        update_payload: None,
    },
    ResourceDescriptor {
        kind: ResourceKind::SurveyResponse,
        type_name: "survey response",
        envelope: "survey_response",
        list_path: "/api/v1/survey_responses",
        item_path: "/api/v1/survey_responses/{id}",
        id_key: Some(SessionKey::QuestionAnswer),
        dependent_keys: &[],
        create_payload: payload::survey_response_create,
        update_payload: None,
    },
];
