//! Test harness for provider implementations.
//!
//! [`ProviderTester`] runs a [`ProviderService`] in-process and strings the
//! RPCs together the way the host does for `apply`, `refresh`, `import` and
//! `destroy`, so a test can focus on the requests sent to the configuration
//! API and the state that comes back.
//!
//! ```ignore
//! let client = ConfigApiClient::new(format!("{}/config/v1", server.uri()), "admin", "secret")?;
//! let tester = ProviderTester::new(PingDirectoryProvider::with_client(
//!     client,
//!     ProductVersion::new(9, 3, 0, 0),
//! ));
//!
//! let state = tester
//!     .apply("pingdirectory_location", None, &json!({"name": "east"}))
//!     .await?;
//! assert_eq!(state["id"], "east");
//! ```

use std::fmt;

use serde_json::Value;

use crate::error::ProviderError;
use crate::schema::Diagnostic;
use crate::server::ProviderService;
use crate::types::PlanResult;

/// Drives a provider the way the host would.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Wrap `provider`.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The wrapped provider, for calling single RPCs directly.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Run `ValidateResourceConfig`, failing on any error diagnostic.
    pub async fn validate(&self, resource_type: &str, config: &Value) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config.clone())
            .await?;
        TestError::from_diagnostics(diagnostics)
    }

    /// Run `ValidateDataSourceConfig`, failing on any error diagnostic.
    pub async fn validate_data_source(
        &self,
        data_source_type: &str,
        config: &Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_data_source_config(data_source_type, config.clone())
            .await?;
        TestError::from_diagnostics(diagnostics)
    }

    /// Plan `config` against `prior` (`None` for a new resource).
    pub async fn plan(
        &self,
        resource_type: &str,
        prior: Option<&Value>,
        config: &Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, prior.cloned(), config.clone(), config.clone())
            .await
    }

    /// Plan and apply `config`, then refresh.
    ///
    /// Without `prior` the resource is created. A plan that requires
    /// replacement deletes `prior` before creating; any other plan is an
    /// update. The refreshed state is returned.
    pub async fn apply(
        &self,
        resource_type: &str,
        prior: Option<&Value>,
        config: &Value,
    ) -> Result<Value, ProviderError> {
        let plan = self.plan(resource_type, prior, config).await?;
        let state = match prior {
            Some(prior) if plan.requires_replace => {
                self.provider.delete(resource_type, prior.clone()).await?;
                self.provider.create(resource_type, plan.planned_state).await?
            },
            Some(prior) => {
                self.provider
                    .update(resource_type, prior.clone(), plan.planned_state)
                    .await?
            },
            None => self.provider.create(resource_type, plan.planned_state).await?,
        };

        self.refresh(resource_type, &state).await?.ok_or_else(|| {
            ProviderError::NotFound(format!("{} disappeared right after apply", resource_type))
        })
    }

    /// Read the resource back. `None` means the host would drop it.
    pub async fn refresh(
        &self,
        resource_type: &str,
        state: &Value,
    ) -> Result<Option<Value>, ProviderError> {
        self.provider.read(resource_type, state.clone()).await
    }

    /// Plan a destroy and delete the resource.
    pub async fn destroy(&self, resource_type: &str, state: &Value) -> Result<(), ProviderError> {
        let plan = self
            .provider
            .plan(resource_type, Some(state.clone()), Value::Null, Value::Null)
            .await?;
        if !plan.planned_state.is_null() {
            return Err(ProviderError::Internal(format!(
                "destroy plan for {} kept a planned state",
                resource_type
            )));
        }
        self.provider.delete(resource_type, state.clone()).await
    }

    /// Import `id`, expecting exactly one resource back.
    pub async fn import(&self, resource_type: &str, id: &str) -> Result<Value, ProviderError> {
        let mut imported = self.provider.import_resource(resource_type, id).await?;
        match imported.len() {
            1 => Ok(imported.remove(0).state),
            n => Err(ProviderError::Internal(format!(
                "import of {} returned {} resources",
                id, n
            ))),
        }
    }

    /// Read a data source.
    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: &Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .read_data_source(data_source_type, config.clone())
            .await
    }
}

/// A harness step failed.
#[derive(Debug)]
pub enum TestError {
    /// Validation returned error diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The provider returned an error.
    Provider(ProviderError),
}

impl TestError {
    fn from_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
        let errors: Vec<_> = diagnostics.into_iter().filter(|d| d.is_error()).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(TestError::Diagnostics(errors))
        }
    }

    /// Summaries of the error diagnostics, or the provider error message.
    pub fn summaries(&self) -> Vec<String> {
        match self {
            TestError::Diagnostics(diagnostics) => {
                diagnostics.iter().map(|d| d.summary.clone()).collect()
            },
            TestError::Provider(e) => vec![e.to_string()],
        }
    }
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestError::Diagnostics(diagnostics) => {
                write!(f, "{} error diagnostic(s):", diagnostics.len())?;
                for d in diagnostics {
                    write!(f, "\n  {}", d.summary)?;
                    if let Some(attribute) = &d.attribute {
                        write!(f, " [{}]", attribute)?;
                    }
                    if let Some(detail) = &d.detail {
                        write!(f, ": {}", detail)?;
                    }
                }
                Ok(())
            },
            TestError::Provider(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(e: ProviderError) -> Self {
        TestError::Provider(e)
    }
}

fn changed_paths(plan: &PlanResult) -> Vec<&str> {
    plan.changes.iter().map(|c| c.path.as_str()).collect()
}

/// Assert that `plan` creates an object where there was none.
pub fn assert_plan_creates(plan: &PlanResult) {
    assert!(
        !plan.changes.is_empty() && !plan.requires_replace,
        "expected a create plan, got replace={} changes={:?}",
        plan.requires_replace,
        changed_paths(plan)
    );
}

/// Assert that `plan` leaves the object alone.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "expected no changes, got {:?}",
        changed_paths(plan)
    );
}

/// Assert that `plan` replaces the object.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(plan.requires_replace, "expected the plan to replace the object");
}

/// Assert that `plan` changes exactly the attributes in `paths`, in place.
pub fn assert_plan_updates(plan: &PlanResult, paths: &[&str]) {
    assert!(
        !plan.requires_replace,
        "expected an in-place update, but the plan replaces the object"
    );
    let mut changed = changed_paths(plan);
    changed.sort_unstable();
    let mut expected = paths.to_vec();
    expected.sort_unstable();
    assert_eq!(changed, expected, "unexpected set of changed attributes");
}

/// Assert that some error diagnostic's summary contains `needle`.
pub fn assert_error_contains(diagnostics: &[Diagnostic], needle: &str) {
    assert!(
        diagnostics
            .iter()
            .any(|d| d.is_error() && d.summary.contains(needle)),
        "no error diagnostic mentions '{}': {:?}",
        needle,
        diagnostics.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}
