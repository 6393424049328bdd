use crate::model::candidate::ConnectivityCandidate;
use crate::model::description::SessionDescription;
use crate::model::role::Role;
use serde::{Deserialize, Serialize};

/// The shared room document both peers read and merge into.
///
/// The initiator owns `offer` and `initiator_candidates`, the responder owns
/// `answer` and `responder_candidates`. Writers only ever touch their own fields.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer: Option<SessionDescription>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<SessionDescription>,

    #[serde(default)]
    pub initiator_candidates: Vec<String>,

    #[serde(default)]
    pub responder_candidates: Vec<String>,
}

impl RoomDocument {
    pub fn with_offer(offer: SessionDescription) -> Self {
        Self {
            offer: Some(offer),
            ..Default::default()
        }
    }

    fn candidates_mut(&mut self, role: Role) -> &mut Vec<String> {
        match role {
            Role::Initiator => &mut self.initiator_candidates,
            Role::Responder => &mut self.responder_candidates,
        }
    }

    /// Raw candidate payloads posted by `role`, in posting order.
    pub fn candidate_payloads(&self, role: Role) -> &[String] {
        match role {
            Role::Initiator => &self.initiator_candidates,
            Role::Responder => &self.responder_candidates,
        }
    }

    pub fn candidates_from(&self, role: Role) -> impl Iterator<Item = ConnectivityCandidate> + '_ {
        self.candidate_payloads(role)
            .iter()
            .map(move |payload| ConnectivityCandidate::new(payload.clone(), role))
    }

    /// Appends a candidate to the list owned by `role`.
    /// Returns `false` if an identical payload is already posted.
    pub fn push_candidate(&mut self, role: Role, payload: &str) -> bool {
        let list = self.candidates_mut(role);
        if list.iter().any(|existing| existing == payload) {
            return false;
        }
        list.push(payload.to_owned());
        true
    }

    /// Field-level union with `other`: descriptions already present are kept,
    /// missing ones are taken from `other`, candidate lists are extended with
    /// the payloads they do not yet contain, preserving order.
    pub fn merge_from(&mut self, other: &RoomDocument) {
        if self.offer.is_none() {
            self.offer = other.offer.clone();
        }
        if self.answer.is_none() {
            self.answer = other.answer.clone();
        }
        for role in [Role::Initiator, Role::Responder] {
            for payload in other.candidate_payloads(role) {
                self.push_candidate(role, payload);
            }
        }
    }
}
