//! Service resolver (§4.B): matches each enabled auxiliary sub-task
//! (diarization, punctuation) to a concrete worker queue before any audio
//! work begins, failing the whole job early if a required task cannot be
//! resolved.
//!
//! Structurally grounded on the teacher's service-capability-advertisement
//! pattern, generalized from a single local service record to a list of
//! queues the orchestrator process is statically configured to know about.

use serde::{Deserialize, Serialize};

use stt_core::types::TranscriptionConfig;
use stt_core::{Error, Result};

/// The kind of auxiliary sub-task a queue advertises support for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    /// Speaker diarization.
    Diarization,
    /// Punctuation restoration.
    Punctuation,
}

/// A live worker queue, as statically advertised to the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueAdvertisement {
    /// Queue name to submit tasks onto.
    pub queue: String,
    /// The sub-task kind this queue serves.
    pub service_type: ServiceType,
    /// The service name workers on this queue identify as.
    pub service_name: String,
}

fn resolve_one(
    task: &'static str,
    service_type: ServiceType,
    pinned_name: Option<&str>,
    live_queues: &[QueueAdvertisement],
) -> Result<(String, String)> {
    let matched = live_queues.iter().find(|q| {
        q.service_type == service_type
            && pinned_name.is_none_or(|name| q.service_name == name)
    });

    match matched {
        Some(q) => Ok((q.service_name.clone(), q.queue.clone())),
        None => Err(Error::UnresolvableTask {
            task: task.to_string(),
        }),
    }
}

/// Resolve every enabled auxiliary sub-task in `config` against `live_queues`,
/// writing `serviceName`/`serviceQueue`/`isAvailable` onto the matched
/// sub-config. A disabled task is trivially resolved (noop).
///
/// # Errors
///
/// Returns [`Error::UnresolvableTask`] if an enabled task has no matching
/// entry in `live_queues`, either because none advertises the required
/// `service_type` or because a pinned `serviceName` matched nothing.
pub fn resolve(config: &mut TranscriptionConfig, live_queues: &[QueueAdvertisement]) -> Result<()> {
    if config.diarization_config.enable_diarization {
        let (service_name, queue) = resolve_one(
            "diarization",
            ServiceType::Diarization,
            config.diarization_config.service_name.as_deref(),
            live_queues,
        )?;
        config.diarization_config.service_name = Some(service_name);
        config.diarization_config.service_queue = Some(queue);
        config.diarization_config.is_available = true;
    } else {
        config.diarization_config.is_available = true;
    }

    if config.punctuation_config.enable_punctuation {
        let (service_name, queue) = resolve_one(
            "punctuation",
            ServiceType::Punctuation,
            config.punctuation_config.service_name.as_deref(),
            live_queues,
        )?;
        config.punctuation_config.service_name = Some(service_name);
        config.punctuation_config.service_queue = Some(queue);
        config.punctuation_config.is_available = true;
    } else {
        config.punctuation_config.is_available = true;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queues() -> Vec<QueueAdvertisement> {
        vec![
            QueueAdvertisement {
                queue: "diarize-1".to_string(),
                service_type: ServiceType::Diarization,
                service_name: "diarization".to_string(),
            },
            QueueAdvertisement {
                queue: "punct-1".to_string(),
                service_type: ServiceType::Punctuation,
                service_name: "punctuation".to_string(),
            },
        ]
    }

    #[test]
    fn disabled_tasks_are_trivially_resolved() {
        let mut config = TranscriptionConfig::default();
        resolve(&mut config, &[]).unwrap();
        assert!(config.diarization_config.is_available);
        assert!(config.punctuation_config.is_available);
        assert!(config.diarization_config.service_queue.is_none());
    }

    #[test]
    fn enabled_task_resolves_to_matching_queue() {
        let mut config = TranscriptionConfig {
            diarization_config: stt_core::types::DiarizationConfig {
                enable_diarization: true,
                ..Default::default()
            },
            ..Default::default()
        };
        resolve(&mut config, &queues()).unwrap();
        assert_eq!(config.diarization_config.service_queue.as_deref(), Some("diarize-1"));
        assert!(config.diarization_config.is_available);
    }

    #[test]
    fn pinned_service_name_must_match_exactly() {
        let mut config = TranscriptionConfig {
            diarization_config: stt_core::types::DiarizationConfig {
                enable_diarization: true,
                service_name: Some("nope".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = resolve(&mut config, &queues()).unwrap_err();
        assert!(matches!(err, Error::UnresolvableTask { .. }));
    }

    #[test]
    fn unresolvable_task_fails_before_any_other_resolution() {
        let mut config = TranscriptionConfig {
            punctuation_config: stt_core::types::PunctuationConfig {
                enable_punctuation: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = resolve(&mut config, &[]).unwrap_err();
        assert!(matches!(err, Error::UnresolvableTask { .. }));
    }
}
