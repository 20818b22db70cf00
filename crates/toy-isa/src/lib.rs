//! A decode engine for a small, made-up, big-endian instruction set. It implements the
//! [pcode_sys::api] traits without a native SLEIGH engine, which makes it possible to exercise
//! translation, delay slot stitching and error reporting deterministically.
//!
//! The first byte of an instruction selects the encoding. Registers are encoded as a single byte
//! holding the register number.
//!
//! | Bytes      | Assembly          | P-code                                  |
//! |------------|-------------------|-----------------------------------------|
//! | `00`       | `nop`             |                                         |
//! | `10 d a b` | `add rd, ra, rb`  | `rd = INT_ADD ra, rb`                   |
//! | `11 d i`   | `mov rd, #i`      | `rd = COPY i`                           |
//! | `12 d a`   | `not rd, ra`      | `rd = INT_NEGATE ra`                    |
//! | `13 d a`   | `zext rd, ra`     | `rd = INT_ZEXT ra[low byte]`            |
//! | `20 d a`   | `ld rd, [ra]`     | `rd = LOAD ram, ra`                     |
//! | `21 a b`   | `st [ra], rb`     | `STORE ram, ra, rb`                     |
//! | `30 r`     | `b target`        | `BRANCH target`                         |
//! | `31 r`     | `bd target`       | `BRANCH target`, 4 bytes of delay slot  |
//! | `32 a r`   | `cbz ra, target`  | `u = INT_EQUAL ra, 0; CBRANCH target, u`|
//! | `33 h l`   | `call target`     | `CALL target`                           |
//! | `34 a`     | `jr ra`           | `BRANCHIND ra`                          |
//! | `35`       | `ret`             | `RETURN r7`                             |
//! | `36 a`     | `callr ra`        | `CALLIND ra`                            |
//! | `37 d a`   | `pop rd, ra`      | `rd = POPCOUNT ra`                      |
//! | `38 d a b` | `pack rd, ra, rb` | `rd = PIECE ra[low half], rb[low half]` |
//! | `fe x`     |                   | unimplemented                           |
//!
//! Relative targets (`r`) are signed and relative to the end of the instruction. Every other byte
//! value, as well as a truncated encoding, is bad data.

mod decode;

use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use pcode_sys::api::{Engine, TranslationContext};
use pcode_sys::sys::{DecodeRequest, RawTranslationResult, RawVarnode, SpaceHandle, SpaceType};

/// Every toy language definition file starts with these bytes.
pub const TOY_LANGUAGE_MAGIC: &[u8] = b"sla\x04toy";

pub const CONSTANT_SPACE: SpaceHandle = SpaceHandle::new(0x7a00_0010);
pub const RAM_SPACE: SpaceHandle = SpaceHandle::new(0x7a00_0020);
pub const REGISTER_SPACE: SpaceHandle = SpaceHandle::new(0x7a00_0030);
pub const UNIQUE_SPACE: SpaceHandle = SpaceHandle::new(0x7a00_0040);

pub const REGISTER_COUNT: u8 = 8;
pub const REGISTER_SIZE: u32 = 4;

/// Length of the delay slot of the `bd` instruction
pub const DELAY_SLOT_LENGTH: u32 = 4;

/// Context variables accepted by [TranslationContext::set_context_default]
pub const CONTEXT_VARIABLES: &[&str] = &["mode"];

struct SpaceInfo {
    handle: SpaceHandle,
    name: &'static str,
    space_type: SpaceType,
}

const SPACES: [SpaceInfo; 4] = [
    SpaceInfo {
        handle: CONSTANT_SPACE,
        name: "const",
        space_type: SpaceType::IPTR_CONSTANT,
    },
    SpaceInfo {
        handle: RAM_SPACE,
        name: "ram",
        space_type: SpaceType::IPTR_PROCESSOR,
    },
    SpaceInfo {
        handle: REGISTER_SPACE,
        name: "register",
        space_type: SpaceType::IPTR_PROCESSOR,
    },
    SpaceInfo {
        handle: UNIQUE_SPACE,
        name: "unique",
        space_type: SpaceType::IPTR_INTERNAL,
    },
];

fn space_info(space: SpaceHandle) -> &'static SpaceInfo {
    SPACES
        .iter()
        .find(|info| info.handle == space)
        .unwrap_or_else(|| panic!("unknown address space handle {space}"))
}

/// Varnode of the register with the given number
pub fn register(number: u8) -> RawVarnode {
    RawVarnode {
        space: REGISTER_SPACE,
        offset: u64::from(number) * u64::from(REGISTER_SIZE),
        size: REGISTER_SIZE,
    }
}

/// Engine producing [ToyContext] instances. Tracks how many contexts are alive so that callers
/// can verify contexts are released.
#[derive(Default)]
pub struct ToyEngine {
    live_contexts: Rc<Cell<usize>>,
}

impl ToyEngine {
    pub fn new() -> Self {
        Default::default()
    }

    /// Number of contexts created by this engine that have not yet been dropped
    pub fn live_contexts(&self) -> usize {
        self.live_contexts.get()
    }
}

impl Engine for ToyEngine {
    type Context = ToyContext;

    fn create_context(&self, language: &Path) -> Result<ToyContext, String> {
        let definition = std::fs::read(language)
            .map_err(|err| format!("failed to read {}: {err}", language.display()))?;

        if !definition.starts_with(TOY_LANGUAGE_MAGIC) {
            return Err(format!(
                "{} is not a toy language definition",
                language.display()
            ));
        }

        self.live_contexts.set(self.live_contexts.get() + 1);
        Ok(ToyContext {
            context_variables: Default::default(),
            live_contexts: Some(Rc::clone(&self.live_contexts)),
        })
    }
}

/// Translation context for the toy instruction set.
#[derive(Default)]
pub struct ToyContext {
    context_variables: BTreeMap<String, u32>,
    live_contexts: Option<Rc<Cell<usize>>>,
}

impl ToyContext {
    /// Create a context that is not tracked by any engine
    pub fn new() -> Self {
        Default::default()
    }

    /// The default value of a context variable, if one was set
    pub fn context_variable(&self, name: &str) -> Option<u32> {
        self.context_variables.get(name).copied()
    }
}

impl Drop for ToyContext {
    fn drop(&mut self) {
        if let Some(live_contexts) = &self.live_contexts {
            live_contexts.set(live_contexts.get() - 1);
        }
    }
}

impl TranslationContext for ToyContext {
    fn num_spaces(&self) -> usize {
        SPACES.len()
    }

    fn space(&self, index: usize) -> SpaceHandle {
        SPACES[index].handle
    }

    fn default_code_space(&self) -> SpaceHandle {
        RAM_SPACE
    }

    fn space_name(&self, space: SpaceHandle) -> String {
        space_info(space).name.to_string()
    }

    fn is_big_endian(&self, space: SpaceHandle) -> bool {
        // Validates the handle
        space_info(space);
        true
    }

    fn space_type(&self, space: SpaceHandle) -> SpaceType {
        space_info(space).space_type
    }

    fn decode(&self, request: &DecodeRequest<'_>) -> RawTranslationResult {
        decode::decode(request)
    }

    fn register_name(&self, space: SpaceHandle, offset: u64, size: u32) -> String {
        let size_matches = size == REGISTER_SIZE;
        let aligned = offset % u64::from(REGISTER_SIZE) == 0;
        let number = offset / u64::from(REGISTER_SIZE);
        if space == REGISTER_SPACE && size_matches && aligned && number < u64::from(REGISTER_COUNT)
        {
            format!("r{number}")
        } else {
            String::new()
        }
    }

    fn register_by_name(&self, name: &str) -> Option<RawVarnode> {
        let number: u8 = name.strip_prefix('r')?.parse().ok()?;
        (number < REGISTER_COUNT).then(|| register(number))
    }

    fn all_register_names(&self) -> Vec<String> {
        (0..REGISTER_COUNT).map(|n| format!("r{n}")).collect()
    }

    fn set_context_default(&mut self, name: &str, value: u32) -> Result<(), String> {
        if !CONTEXT_VARIABLES.contains(&name) {
            return Err(format!("unknown context variable {name}"));
        }

        self.context_variables.insert(name.to_string(), value);
        Ok(())
    }
}
