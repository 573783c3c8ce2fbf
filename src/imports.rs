use crate::error::*;
use crate::function::ImportFunction;
use crate::value::Value;
use std::collections::HashMap;

/// Host callables keyed by `(module, field)`.
pub struct Imports<H> {
    modules: HashMap<String, HashMap<String, ImportFunction<H>>>,
}

impl<H> Default for Imports<H> {
    fn default() -> Self { Self { modules: HashMap::new() } }
}

impl<H> Imports<H> {
    pub fn new() -> Self { Self::default() }

    pub fn define(&mut self, module: &str, field: &str, func: ImportFunction<H>) -> &mut Self {
        self.modules.entry(module.to_string()).or_default().insert(field.to_string(), func);
        self
    }

    pub fn func(
        &mut self,
        module: &str,
        field: &str,
        nparams: usize,
        returns: bool,
        callback: impl Fn(&mut H, &[Value]) -> Option<Value> + 'static,
    ) -> &mut Self {
        self.define(module, field, ImportFunction::new(nparams, returns, callback))
    }

    pub fn get(&self, module: &str, field: &str) -> Option<&ImportFunction<H>> {
        self.modules.get(module).and_then(|m| m.get(field))
    }

    /// Finds the callable for an import and checks it against the declared
    /// arity.
    pub fn resolve(&self, module: &str, field: &str, nparams: usize, returns: bool) -> Result<ImportFunction<H>, Error> {
        let func = self.get(module, field).ok_or(Error::link(UNKNOWN_IMPORT))?;
        if func.nparams != nparams || func.returns != returns {
            return Err(Error::link(INCOMPATIBLE_IMPORT));
        }
        Ok(func.clone())
    }
}
