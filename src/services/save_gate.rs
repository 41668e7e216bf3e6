// src/services/save_gate.rs
//
// Save Gate
//
// CRITICAL RULES:
// - Name and compatibility are checked before any catalog call
// - The first blocking verdict, in rule order, is surfaced verbatim
// - Create when the build has no id yet, update otherwise
// - The server power estimate runs only after persistence succeeded
// - The gate never mutates the configuration; the caller records the id

use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;

use crate::domain::{
    validate_build_name, BuildId, BuildPayload, BuildSnapshot, CompatibilityReport,
};
use crate::error::SaveError;
use crate::events::{BuildSaveRejected, BuildSaved, EventBus, ServerPowerEstimated};
use crate::integrations::CatalogGateway;

/// A successful save
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveOutcome {
    pub build_id: BuildId,
    /// False when an existing build was updated
    pub created: bool,
    /// Authoritative draw computed by the catalog, in watts
    pub server_power_watts: f64,
}

impl SaveOutcome {
    pub fn message(&self) -> String {
        format!(
            "Build {} successfully!",
            if self.created { "saved" } else { "updated" }
        )
    }
}

pub struct SaveGate {
    gateway: Arc<dyn CatalogGateway>,
    event_bus: Arc<EventBus>,
}

impl SaveGate {
    pub fn new(gateway: Arc<dyn CatalogGateway>, event_bus: Arc<EventBus>) -> Self {
        Self {
            gateway,
            event_bus,
        }
    }

    /// Client-side preconditions, no I/O
    pub fn check(snapshot: &BuildSnapshot, report: &CompatibilityReport) -> Result<(), SaveError> {
        if validate_build_name(&snapshot.name).is_err() {
            return Err(SaveError::EmptyName);
        }

        if let Some(blocking) = report.first_blocking() {
            return Err(SaveError::Blocked {
                rule: blocking.rule.key(),
                message: blocking.verdict.message.clone(),
            });
        }

        Ok(())
    }

    /// Validate, persist, then ask the catalog for the power estimate
    ///
    /// `report` must belong to `snapshot`.
    pub async fn save(
        &self,
        snapshot: &BuildSnapshot,
        report: &CompatibilityReport,
    ) -> Result<SaveOutcome, SaveError> {
        if let Err(e) = Self::check(snapshot, report) {
            warn!("Save rejected: {}", e);
            self.event_bus.emit(BuildSaveRejected::new(e.to_string()));
            return Err(e);
        }

        let payload = BuildPayload::from_snapshot(snapshot);

        let (build_id, created) = match snapshot.build_id {
            Some(build_id) => {
                self.gateway
                    .update_build(build_id, &payload)
                    .await
                    .map_err(SaveError::Persistence)?;
                (build_id, false)
            }
            None => {
                let build_id = self
                    .gateway
                    .create_build(&payload)
                    .await
                    .map_err(SaveError::Persistence)?;
                (build_id, true)
            }
        };

        info!(
            "Build {} '{}' {}",
            build_id,
            payload.build_name,
            if created { "created" } else { "updated" }
        );
        self.event_bus
            .emit(BuildSaved::new(build_id, payload.build_name.clone(), created));

        let server_power_watts =
            self.gateway
                .estimate_power(build_id)
                .await
                .map_err(|e| SaveError::PowerEstimate {
                    build_id,
                    detail: e.to_string(),
                })?;

        self.event_bus
            .emit(ServerPowerEstimated::new(build_id, server_power_watts));

        Ok(SaveOutcome {
            build_id,
            created,
            server_power_watts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        default_rules, BuildConfiguration, CompatibilityVerdict, Component, Generation,
        PartCategory, RuleVerdict,
    };
    use crate::error::GatewayError;
    use crate::integrations::MockCatalogGateway;
    use mockall::predicate::eq;

    fn report_with(messages: [&str; 3]) -> CompatibilityReport {
        let verdicts = default_rules()
            .into_iter()
            .zip(messages)
            .map(|(rule, message)| RuleVerdict {
                rule,
                verdict: CompatibilityVerdict::from_message(message),
            })
            .collect();
        CompatibilityReport::completed(Generation::ZERO, verdicts)
    }

    fn named(name: &str) -> BuildConfiguration {
        let mut config = BuildConfiguration::default();
        config.set_name(name);
        config.set_slot(Component::new(PartCategory::Cpu, 1, "cpu", 1.0));
        config
    }

    #[test]
    fn test_empty_name_aborts_regardless_of_compatibility() {
        let config = named("");
        let clean = report_with(["Compatible", "Compatible", "Compatible"]);
        let blocked = report_with(["Incompatible socket", "Compatible", "Compatible"]);

        assert_eq!(
            SaveGate::check(&config.snapshot(), &clean),
            Err(SaveError::EmptyName)
        );
        assert_eq!(
            SaveGate::check(&config.snapshot(), &blocked),
            Err(SaveError::EmptyName)
        );
    }

    #[test]
    fn test_whitespace_name_passes_the_gate() {
        let clean = report_with(["Compatible", "Compatible", "Compatible"]);
        assert!(SaveGate::check(&named("   ").snapshot(), &clean).is_ok());
    }

    #[test]
    fn test_first_blocking_verdict_in_rule_order() {
        let config = named("Gaming Rig");
        let report = report_with(["Compatible", "Invalid form factor", "PSU requires 750W"]);

        let err = SaveGate::check(&config.snapshot(), &report).unwrap_err();
        assert_eq!(err.to_string(), "Invalid form factor");
        assert!(matches!(err, SaveError::Blocked { ref rule, .. } if rule == "motherboard×case"));
    }

    #[tokio::test]
    async fn test_blocked_save_makes_no_call() {
        let mut mock = MockCatalogGateway::new();
        mock.expect_create_build().never();
        mock.expect_update_build().never();
        mock.expect_estimate_power().never();

        let event_bus = Arc::new(EventBus::new());
        let gate = SaveGate::new(Arc::new(mock), Arc::clone(&event_bus));
        let report = report_with(["Incompatible socket", "Compatible", "Compatible"]);

        let err = gate
            .save(&named("Gaming Rig").snapshot(), &report)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Incompatible socket");
        assert_eq!(event_bus.get_event_log()[0].event_type, "BuildSaveRejected");
    }

    #[tokio::test]
    async fn test_create_then_estimate() {
        let mut mock = MockCatalogGateway::new();
        mock.expect_create_build()
            .withf(|payload| payload.build_name == "Gaming Rig" && payload.cpu_id == Some(1))
            .times(1)
            .returning(|_| Ok(42));
        mock.expect_estimate_power()
            .with(eq(42))
            .times(1)
            .returning(|_| Ok(365.0));

        let gate = SaveGate::new(Arc::new(mock), Arc::new(EventBus::new()));
        let report = report_with(["Compatible", "Compatible", "Compatible"]);

        let outcome = gate
            .save(&named("Gaming Rig").snapshot(), &report)
            .await
            .unwrap();
        assert_eq!(outcome.build_id, 42);
        assert!(outcome.created);
        assert_eq!(outcome.message(), "Build saved successfully!");
    }

    #[tokio::test]
    async fn test_existing_build_is_updated() {
        let mut mock = MockCatalogGateway::new();
        mock.expect_create_build().never();
        mock.expect_update_build()
            .with(eq(7), mockall::predicate::always())
            .times(1)
            .returning(|_, _| Ok(()));
        mock.expect_estimate_power().returning(|_| Ok(200.0));

        let gate = SaveGate::new(Arc::new(mock), Arc::new(EventBus::new()));
        let mut config = named("Office");
        config.set_build_id(7);

        let outcome = gate
            .save(&config.snapshot(), &CompatibilityReport::default())
            .await
            .unwrap();
        assert!(!outcome.created);
        assert_eq!(outcome.message(), "Build updated successfully!");
    }

    #[tokio::test]
    async fn test_persistence_failure_is_verbatim() {
        let mut mock = MockCatalogGateway::new();
        mock.expect_create_build().returning(|_| {
            Err(GatewayError::with_status(
                400,
                Some("PSU wattage insufficient for selected GPU".to_string()),
            ))
        });
        mock.expect_estimate_power().never();

        let gate = SaveGate::new(Arc::new(mock), Arc::new(EventBus::new()));
        let err = gate
            .save(&named("Rig").snapshot(), &CompatibilityReport::default())
            .await
            .unwrap_err();

        assert!(matches!(err, SaveError::Persistence(_)));
        assert_eq!(err.to_string(), "PSU wattage insufficient for selected GPU");
    }

    #[tokio::test]
    async fn test_power_estimate_failure_keeps_build_id() {
        let mut mock = MockCatalogGateway::new();
        mock.expect_create_build().returning(|_| Ok(9));
        mock.expect_estimate_power()
            .returning(|_| Err(GatewayError::with_status(500, None)));

        let gate = SaveGate::new(Arc::new(mock), Arc::new(EventBus::new()));
        let err = gate
            .save(&named("Rig").snapshot(), &CompatibilityReport::default())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            SaveError::PowerEstimate {
                build_id: 9,
                detail: "An unknown error occurred.".to_string()
            }
        );
    }
}
