mod opcodes;
mod space;
mod translate;

use toy_isa::ToyContext;

use crate::Session;

fn toy_session() -> Session<ToyContext> {
    Session::new(ToyContext::new())
}
