// The interaction pipeline: wizard state machine, session store, handlers.
// All session state is owned by the controller in session.rs — there are no
// ambient globals, and the state machine itself is pure.

pub mod handlers;
pub mod session;
pub mod state;
