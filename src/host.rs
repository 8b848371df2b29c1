// ABOUTME: Host-provided capability traits and execution options (§6)

use std::rc::Rc;

use crate::value::Value;

/// A host HTTP response (§6 "FetchFn"). `ok` false means the built-in
/// that wraps this call yields Null rather than the body.
pub struct FetchResponse {
    pub ok: bool,
    pub text: Option<String>,
    pub json: Option<Value>,
}

/// Host-provided fetch capability. Implementations that lack async
/// primitives may run this synchronously (§9 "Async built-ins").
pub trait Fetcher {
    fn fetch(&self, url: &str, options: Option<&Value>) -> FetchResponse;
}

/// Host-provided debug logging capability (§6 "LogFn").
pub trait Logger {
    fn log(&self, text: &str);
}

/// Resolves `include` statements into further script text (§6
/// "IncludeResolver"). The interpreter still deduplicates by URL and
/// terminates circular inclusion itself (§6 "Circular inclusions must be
/// detected and terminated"), since a resolver may be called from more than
/// one `Include` statement across an execution.
pub trait IncludeResolver {
    fn resolve(&self, url: &str, system: bool, base_url: &str) -> Option<String>;
}

/// Execution options for `execute` (§4.3 "Contract").
#[derive(Clone, Default)]
pub struct ExecOptions {
    /// Maximum statement dispatches for one execution; 0 disables the check.
    /// Defaults to 10,000,000 per §4.3.
    pub max_statements: u64,
    pub fetcher: Option<Rc<dyn Fetcher>>,
    pub logger: Option<Rc<dyn Logger>>,
    /// Resolves `Include` statements at runtime (§6 "IncludeResolver"). When
    /// absent, `Include` statements are a no-op, per §4.3.
    pub resolver: Option<Rc<dyn IncludeResolver>>,
    /// Base URL passed to `resolver.resolve` for relative-URL resolution.
    pub base_url: String,
}

impl ExecOptions {
    pub fn new() -> Self {
        ExecOptions {
            max_statements: 10_000_000,
            fetcher: None,
            logger: None,
            resolver: None,
            base_url: String::new(),
        }
    }
}
