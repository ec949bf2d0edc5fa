//! In-memory session store
//!
//! A session pins one trained pipeline plus the current slider state.
//! Slider changes only recompute the prediction.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::models::{ControlInput, SessionView, TrainingSummary};
use crate::pipeline::TrainedPipeline;

#[derive(Clone)]
pub struct Session {
    pub id: Uuid,
    pub file_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub cached: bool,
    pub pipeline: Arc<TrainedPipeline>,
    pub controls: ControlInput,
}

impl Session {
    pub fn new(file_name: Option<String>, pipeline: Arc<TrainedPipeline>, cached: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name,
            created_at: Utc::now(),
            cached,
            pipeline,
            controls: ControlInput::default(),
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id,
            file_name: self.file_name.clone(),
            created_at: self.created_at,
            cached: self.cached,
            training: TrainingSummary::from(self.pipeline.as_ref()),
            evaluation: self.pipeline.evaluation.clone(),
            controls: self.controls,
            prediction: self.pipeline.predict(&self.controls.into()),
        }
    }
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<Uuid, Session>,
    order: VecDeque<Uuid>,
}

pub struct SessionStore {
    max_sessions: usize,
    inner: RwLock<Inner>,
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            max_sessions: max_sessions.max(1),
            inner: RwLock::new(Inner::default()),
        }
    }

    pub fn insert(&self, session: Session) -> SessionView {
        let view = session.view();
        let mut inner = self.inner.write();
        inner.order.push_back(session.id);
        inner.sessions.insert(session.id, session);

        while inner.sessions.len() > self.max_sessions {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            if inner.sessions.remove(&oldest).is_some() {
                tracing::debug!("Evicted session {}", oldest);
            }
        }
        view
    }

    pub fn view(&self, id: Uuid) -> Option<SessionView> {
        self.inner.read().sessions.get(&id).map(Session::view)
    }

    /// Replace slider state, returning the refreshed view
    pub fn set_controls(&self, id: Uuid, controls: ControlInput) -> Option<SessionView> {
        let mut inner = self.inner.write();
        let session = inner.sessions.get_mut(&id)?;
        session.controls = controls;
        Some(session.view())
    }

    pub fn pipeline(&self, id: Uuid) -> Option<Arc<TrainedPipeline>> {
        self.inner.read().sessions.get(&id).map(|s| s.pipeline.clone())
    }

    pub fn remove(&self, id: Uuid) -> bool {
        let mut inner = self.inner.write();
        let removed = inner.sessions.remove(&id).is_some();
        if removed {
            inner.order.retain(|other| *other != id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.read().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Outcome;
    use crate::pipeline::{fixtures::plant_csv, run_upload, PipelineParams};

    fn pipeline() -> Arc<TrainedPipeline> {
        let csv = plant_csv(150, 11);
        let params = PipelineParams {
            seed: Some(11),
            ..Default::default()
        };
        Arc::new(run_upload(Some("plant.csv"), csv.as_bytes(), &params).unwrap())
    }

    #[test]
    fn test_new_session_uses_default_controls() {
        let store = SessionStore::new(8);
        let view = store.insert(Session::new(Some("plant.csv".into()), pipeline(), false));
        assert_eq!(view.controls, ControlInput::default());
        assert_eq!(store.len(), 1);
        assert!(store.view(view.session_id).is_some());
    }

    #[test]
    fn test_set_controls_recomputes_prediction_only() {
        let store = SessionStore::new(8);
        let shared = pipeline();
        let view = store.insert(Session::new(None, shared.clone(), false));

        let hot = ControlInput {
            temperature: 110.0,
            vibration: 15.0,
            pressure: 100.0,
            downtime_hrs: 4,
        };
        let updated = store.set_controls(view.session_id, hot).unwrap();
        assert_eq!(updated.controls, hot);
        assert_eq!(updated.prediction.failure, Outcome::Failure);
        assert_eq!(updated.evaluation.accuracy, view.evaluation.accuracy);
        assert!(Arc::ptr_eq(&store.pipeline(view.session_id).unwrap(), &shared));
    }

    #[test]
    fn test_unknown_session() {
        let store = SessionStore::new(8);
        let id = Uuid::new_v4();
        assert!(store.view(id).is_none());
        assert!(store.set_controls(id, ControlInput::default()).is_none());
        assert!(!store.remove(id));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let store = SessionStore::new(2);
        let shared = pipeline();
        let first = store.insert(Session::new(None, shared.clone(), false));
        let second = store.insert(Session::new(None, shared.clone(), true));
        let third = store.insert(Session::new(None, shared, true));

        assert_eq!(store.len(), 2);
        assert!(store.view(first.session_id).is_none());
        assert!(store.view(second.session_id).is_some());
        assert!(store.view(third.session_id).is_some());
    }

    #[test]
    fn test_remove() {
        let store = SessionStore::new(2);
        let view = store.insert(Session::new(None, pipeline(), false));
        assert!(store.remove(view.session_id));
        assert!(store.is_empty());
    }
}
