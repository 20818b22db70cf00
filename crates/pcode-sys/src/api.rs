use std::path::Path;

use super::sys::{DecodeRequest, RawTranslationResult, RawVarnode, SpaceHandle, SpaceType};

/// A decode engine able to load language definitions. Errors are returned as [String] since they
/// typically originate on the other side of an FFI boundary.
pub trait Engine {
    type Context: TranslationContext;

    /// Load the compiled language definition at `language` and create a translation context for
    /// it. Dropping the context must release every resource the engine holds for it.
    fn create_context(&self, language: &Path) -> Result<Self::Context, String>;
}

/// A translation context for a single loaded language.
///
/// Space queries must only be made with handles this context produced, either directly through
/// [TranslationContext::space] or inside the results of [TranslationContext::decode].
pub trait TranslationContext {
    /// Number of address spaces defined by the language
    fn num_spaces(&self) -> usize;

    /// Handle of the address space at `index`, where `index < num_spaces()`
    fn space(&self, index: usize) -> SpaceHandle;

    /// Handle of the address space instructions are decoded from
    fn default_code_space(&self) -> SpaceHandle;

    fn space_name(&self, space: SpaceHandle) -> String;

    fn is_big_endian(&self, space: SpaceHandle) -> bool;

    fn space_type(&self, space: SpaceHandle) -> SpaceType;

    /// Decode the requested bytes. Decoding stops at the first failure, which is reported in the
    /// error of the result.
    fn decode(&self, request: &DecodeRequest<'_>) -> RawTranslationResult;

    /// Name of the register at the given location. Returns an empty string if there is no
    /// register at this location.
    fn register_name(&self, space: SpaceHandle, offset: u64, size: u32) -> String;

    fn register_by_name(&self, name: &str) -> Option<RawVarnode>;

    fn all_register_names(&self) -> Vec<String>;

    /// Set the default value of a context variable. Fails if the name does not correspond to an
    /// existing context variable.
    fn set_context_default(&mut self, name: &str, value: u32) -> Result<(), String>;
}
