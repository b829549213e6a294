//! Compile entry point: clear, parse, fold, evaluate, then emit or report.

use log::{debug, trace, warn};

use crate::backend::Derived;
use crate::bindings::{Bindings, DiagnosticReport};
use crate::cache::OperationCache;
use crate::config::CompilerConfig;
use crate::error::Result;
use crate::eval::{CompileMode, Evaluator};
use crate::fold::fold_unary;
use crate::parser::parse;
use crate::token::TokenStream;
use crate::value::Value;

/// Result of [`Compiler::compile`].
#[derive(Debug, Clone, PartialEq)]
pub enum CompileOutput<H> {
    /// Emit mode. `None` when the expression was an assignment.
    Value(Option<Value<H>>),
    /// Validate mode.
    Report(DiagnosticReport),
}

/// Reusable expression compiler bound to one backend.
///
/// Every call starts by clearing its per-call buffers, so results never leak between
/// compiles. A single instance is not meant to be shared across threads mid-compile;
/// use one compiler per thread or guard it externally.
#[derive(Debug)]
pub struct Compiler<B: Derived> {
    backend: B,
    config: CompilerConfig,
    bindings: Bindings<B::Handle>,
    cache: OperationCache<B::Handle>,
    stream: TokenStream,
}

impl<B: Derived> Compiler<B> {
    pub fn new(backend: B) -> Self {
        Compiler {
            backend,
            config: CompilerConfig::default(),
            bindings: Bindings::new(),
            cache: OperationCache::new(),
            stream: TokenStream::new(),
        }
    }

    /// Create a compiler with custom settings, validating them first.
    pub fn with_config(backend: B, config: CompilerConfig) -> Result<Self> {
        config.validate()?;
        let mut compiler = Self::new(backend);
        compiler.config = config;
        Ok(compiler)
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Distinct backend signatures produced by the most recent compile.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Compile `expression` against `bindings`.
    ///
    /// In [`CompileMode::Emit`] backend primitives run and the optimised result is
    /// returned; unresolved identifiers are errors. In [`CompileMode::Validate`] nothing
    /// reaches the backend and identifier usage is reported instead.
    pub fn compile<I, S>(
        &mut self,
        expression: &str,
        mode: CompileMode,
        bindings: I,
    ) -> Result<CompileOutput<B::Handle>>
    where
        I: IntoIterator<Item = (S, Value<B::Handle>)>,
        S: Into<String>,
    {
        self.reset(bindings);
        debug!(
            "compile ({mode:?}, {} binding(s)): {expression}",
            self.bindings.len()
        );
        let stream = self.prepare(expression)?;
        let result = self.run(stream, mode)?;
        Ok(self.output(mode, result))
    }

    /// Evaluate an already parsed stream as given; no unary folding is applied.
    pub fn compile_stream<I, S>(
        &mut self,
        stream: TokenStream,
        mode: CompileMode,
        bindings: I,
    ) -> Result<CompileOutput<B::Handle>>
    where
        I: IntoIterator<Item = (S, Value<B::Handle>)>,
        S: Into<String>,
    {
        self.reset(bindings);
        debug!("compile stream ({mode:?}): {stream}");
        let result = self.run(stream, mode)?;
        Ok(self.output(mode, result))
    }

    /// Emit-mode convenience returning the produced value directly.
    pub fn emit<I, S>(&mut self, expression: &str, bindings: I) -> Result<Option<Value<B::Handle>>>
    where
        I: IntoIterator<Item = (S, Value<B::Handle>)>,
        S: Into<String>,
    {
        self.reset(bindings);
        debug!("emit: {expression}");
        let stream = self.prepare(expression)?;
        self.run(stream, CompileMode::Emit)
    }

    /// Validate-mode convenience returning the diagnostic report directly.
    pub fn validate<I, S>(&mut self, expression: &str, bindings: I) -> Result<DiagnosticReport>
    where
        I: IntoIterator<Item = (S, Value<B::Handle>)>,
        S: Into<String>,
    {
        self.reset(bindings);
        debug!("validate: {expression}");
        let stream = self.prepare(expression)?;
        self.run(stream, CompileMode::Validate)?;
        Ok(self.bindings.report())
    }

    fn reset<I, S>(&mut self, bindings: I)
    where
        I: IntoIterator<Item = (S, Value<B::Handle>)>,
        S: Into<String>,
    {
        self.stream.clear();
        self.cache.clear();
        self.bindings.clear();
        self.bindings.register(bindings);
    }

    /// Parse and fold `expression` into the stream the evaluator consumes.
    fn prepare(&self, expression: &str) -> Result<TokenStream> {
        let stream = parse(expression, self.config.max_depth)?.into_stream();
        trace!("parsed: {stream}");
        let stream = fold_unary(stream);
        trace!("folded: {stream}");
        Ok(stream)
    }

    fn run(&mut self, stream: TokenStream, mode: CompileMode) -> Result<Option<Value<B::Handle>>> {
        self.stream = stream;
        let result = Evaluator {
            backend: &mut self.backend,
            bindings: &mut self.bindings,
            cache: &mut self.cache,
            stream: &mut self.stream,
            mode,
        }
        .evaluate()?;

        if !self.stream.is_empty() {
            warn!(
                "{} token(s) left unconsumed: {}",
                self.stream.len(),
                self.stream
            );
        }

        match (mode, result) {
            (CompileMode::Emit, Some(value)) => Ok(Some(self.backend.optimize(value)?)),
            (_, result) => Ok(result),
        }
    }

    fn output(&self, mode: CompileMode, result: Option<Value<B::Handle>>) -> CompileOutput<B::Handle> {
        match mode {
            CompileMode::Emit => CompileOutput::Value(result),
            CompileMode::Validate => CompileOutput::Report(self.bindings.report()),
        }
    }
}
