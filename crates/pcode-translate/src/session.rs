use std::borrow::Cow;
use std::path::{Path, PathBuf};

use pcode_sys::api::{Engine, TranslationContext};
use pcode_sys::sys::{DecodeRequest, SpaceHandle};

use crate::error::{Error, Result};
use crate::location::Varnode;
use crate::space::{AddrSpace, SessionId, SpaceRegistry};
use crate::translation::{TranslateOptions, Translation, TranslationResult};

/// The language has not yet been provided
pub enum MissingLanguage {}

/// The language has been provided
pub enum HasLanguage {}

/// Builder for [Session]. The parameter `L` tracks whether the language has been provided.
pub struct SessionBuilder<L> {
    language: Option<PathBuf>,

    /// Context variable defaults, applied in insertion order
    context_defaults: Vec<(String, u32)>,

    language_state: std::marker::PhantomData<L>,
}

impl Default for SessionBuilder<MissingLanguage> {
    fn default() -> Self {
        Self {
            language: None,
            context_defaults: Vec::new(),
            language_state: std::marker::PhantomData,
        }
    }
}

impl<L> SessionBuilder<L> {
    /// Set the default value of a context variable. Processor specifications typically provide
    /// these, e.g. `addrsize` and `opsize` for x86-64.
    pub fn context_default(mut self, name: impl Into<String>, value: u32) -> Self {
        self.context_defaults.push((name.into(), value));
        self
    }
}

impl SessionBuilder<MissingLanguage> {
    /// Use the compiled language definition at this path.
    pub fn language(self, path: impl AsRef<Path>) -> Result<SessionBuilder<HasLanguage>> {
        let path = path.as_ref();
        if path.to_str().is_none() {
            return Err(Error::InvalidInput {
                message: Cow::Borrowed("path should be a valid UTF-8"),
            });
        }

        Ok(SessionBuilder::<HasLanguage> {
            language: Some(path.to_path_buf()),
            context_defaults: self.context_defaults,
            language_state: std::marker::PhantomData,
        })
    }
}

impl SessionBuilder<HasLanguage> {
    pub fn build<E: Engine>(self, engine: &E) -> Result<Session<E::Context>> {
        let language = self.language.ok_or_else(|| Error::InvalidInput {
            message: Cow::Borrowed("language is required"),
        })?;

        let mut context =
            engine
                .create_context(&language)
                .map_err(|err| Error::DependencyError {
                    message: Cow::Owned(format!(
                        "failed to load language {language}",
                        language = language.display()
                    )),
                    source: err.into(),
                })?;

        for (name, value) in self.context_defaults {
            context
                .set_context_default(&name, value)
                .map_err(|err| Error::DependencyError {
                    message: Cow::Owned(format!("failed to set context variable {name}")),
                    source: err.into(),
                })?;
        }

        Ok(Session::new(context))
    }
}

/// A loaded language. Every entity produced by a session ([AddrSpace], [crate::Address],
/// [crate::Varnode], ...) is scoped to it.
///
/// The address space registry is not synchronized, so a session cannot be shared between
/// threads. Dropping the session drops the engine context.
pub struct Session<C> {
    id: SessionId,
    registry: SpaceRegistry,

    /// Spaces defined by the language, in engine order
    spaces: Vec<AddrSpace>,

    context: C,
}

impl Session<()> {
    /// Create a new session builder. Use this to load a language. The context type of the
    /// session is determined by the engine passed to [SessionBuilder::build].
    pub fn builder() -> SessionBuilder<MissingLanguage> {
        Default::default()
    }
}

impl<C: TranslationContext> Session<C> {
    /// Create a session for an existing engine context.
    pub fn new(context: C) -> Self {
        let id = SessionId::next();
        let registry = SpaceRegistry::new(id);
        let spaces = (0..context.num_spaces())
            .map(|index| registry.resolve(&context, context.space(index)))
            .collect::<Vec<_>>();

        log::debug!(
            "session {id}: created with {count} address spaces",
            count = spaces.len()
        );

        Self {
            id,
            registry,
            spaces,
            context,
        }
    }

    /// The engine context of this session
    pub fn context(&self) -> &C {
        &self.context
    }

    /// Address spaces defined by the language
    pub fn spaces(&self) -> &[AddrSpace] {
        &self.spaces
    }

    /// Get an address space by name (if it exists)
    pub fn space(&self, name: impl AsRef<str>) -> Option<AddrSpace> {
        let name = name.as_ref();
        self.spaces
            .iter()
            .find(|space| space.name() == name)
            .cloned()
    }

    /// Get the default address space for code execution
    pub fn default_code_space(&self) -> AddrSpace {
        self.resolve_space(self.context.default_code_space())
    }

    /// Get the register name for a varnode targeting a register. This will return `None` if the
    /// target is not a valid register.
    pub fn register_name(&self, varnode: &Varnode) -> Option<String> {
        self.assert_owns(&varnode.space);

        // An overflowing range can accidentally match a register
        let size = u32::try_from(varnode.size).ok()?;
        varnode.offset.checked_add(size.into())?;

        let name = self
            .context
            .register_name(varnode.space.handle(), varnode.offset, size);

        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }

    /// Get the [Varnode] of the named register.
    pub fn register(&self, name: impl AsRef<str>) -> Result<Varnode> {
        let name = name.as_ref();
        self.context
            .register_by_name(name)
            .map(|register| Varnode::from_raw(self, &register))
            .ok_or_else(|| Error::UnknownRegister(name.to_string()))
    }

    /// Names of all registers defined by the language
    pub fn register_names(&self) -> Vec<String> {
        self.context.all_register_names()
    }

    /// Translate the machine code in `code`, whose first byte is located at `base`.
    ///
    /// Decode failures do not fail this call. Instead decoding stops and the failure is reported
    /// in [TranslationResult::error] alongside the instructions decoded before it. Instructions
    /// with delay slots are returned with their delay slot instructions attached.
    ///
    /// # Panics
    ///
    /// Panics if a delay slot cannot be decoded. Delay slots are always valid standalone
    /// instructions, so this indicates a defect in the engine.
    pub fn translate(
        &self,
        code: &[u8],
        base: u64,
        options: &TranslateOptions,
    ) -> Result<TranslationResult> {
        if code.is_empty() {
            return Err(Error::InvalidInput {
                message: Cow::Borrowed("code should not be empty"),
            });
        }

        let max_bytes = if options.max_bytes > 0 {
            options.max_bytes.min(code.len())
        } else {
            code.len()
        };

        let request = DecodeRequest {
            bytes: &code[..max_bytes],
            base,
            max_instructions: options.max_instructions,
            stop_at_basic_block: options.stop_at_basic_block,
            stop_at_nonlinear_basic_block: options.stop_at_nonlinear_basic_block,
        };

        let mut result = {
            let raw = self.context.decode(&request);
            TranslationResult::from_raw(self, &raw)
        };

        log::debug!(
            "session {id}: decoded {count} instructions from {max_bytes} bytes at {base:#x}",
            id = self.id,
            count = result.instructions.len()
        );

        if let Some(err) = &result.error {
            log::debug!("session {id}: decoding stopped: {err}", id = self.id);
            return Ok(result);
        }

        for instruction in result.instructions.iter_mut() {
            if instruction.has_delay_slots() {
                let delay_slots = self.translate_delay_slots(code, base, instruction)?;
                instruction.delay_slots = delay_slots;
            }
        }

        Ok(result)
    }

    /// Decode the delay slots that follow `instruction`.
    fn translate_delay_slots(
        &self,
        code: &[u8],
        base: u64,
        instruction: &Translation,
    ) -> Result<Vec<Translation>> {
        let offset = instruction
            .address
            .offset
            .wrapping_add(instruction.length as u64)
            .wrapping_sub(base);

        let offset = usize::try_from(offset)
            .ok()
            .filter(|&offset| offset < code.len())
            .unwrap_or_else(|| {
                panic!(
                    "delay slot of {address} is outside of the code",
                    address = instruction.address
                )
            });

        log::trace!(
            "session {id}: decoding {length} delay slot bytes of {address}",
            id = self.id,
            length = instruction.delay_slot_length,
            address = instruction.address
        );

        let options = TranslateOptions::default().max_bytes(instruction.delay_slot_length);
        let delay_slots = self.translate(
            &code[offset..],
            base.wrapping_add(offset as u64),
            &options,
        )?;

        if let Some(err) = delay_slots.error {
            panic!(
                "failed to decode delay slot of {address}: {err}",
                address = instruction.address
            );
        }

        Ok(delay_slots.instructions)
    }

    pub(crate) fn resolve_space(&self, handle: SpaceHandle) -> AddrSpace {
        self.registry.resolve(&self.context, handle)
    }

    /// Panics if `space` was not produced by this session.
    pub(crate) fn assert_owns(&self, space: &AddrSpace) {
        assert_eq!(
            space.session(),
            self.id,
            "address space {space} belongs to another session"
        );
    }

    #[cfg(test)]
    pub(crate) fn registry(&self) -> &SpaceRegistry {
        &self.registry
    }
}
