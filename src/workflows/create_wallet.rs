//! Wallet creation child machine.
//!
//! Spawned by `getStarted` when the user begins creating or restoring a
//! wallet. Its context is a projection of the triggering event: whether
//! the wallet is new, the master public key for watch-only setups, and
//! whether a hardware device drives the keys.

use crate::builder::{MachineBuilder, StateBuilder, TransitionBuilder};
use crate::core::MachineDefinition;
use crate::registry::HandlerRegistry;
use crate::workflows::event_value;
use crate::{context, patch};

/// The `createWallet` machine document.
pub fn machine() -> MachineDefinition {
    MachineBuilder::new("createWallet")
        .initial("createWalletInit")
        .context(context! {
            "isNew": null,
            "walletMasterPubKey": null,
            "isTrezor": null,
            "error": null,
        })
        .state(
            StateBuilder::new("createWalletInit")
                .on(
                    "CONTINUE",
                    TransitionBuilder::to("writeSeed").guard("isNewWallet"),
                )
                .on(
                    "CONTINUE",
                    TransitionBuilder::to("restoreWallet").guard("isRestoreWallet"),
                )
                .on(
                    "ERROR",
                    TransitionBuilder::to("createWalletInit").assign("assignCreateWalletError"),
                ),
        )
        .state(
            StateBuilder::new("writeSeed")
                .on("SEED_COPIED", TransitionBuilder::to("confirmSeed"))
                .on("BACK", TransitionBuilder::to("createWalletInit"))
                .on(
                    "ERROR",
                    TransitionBuilder::to("writeSeed").assign("assignCreateWalletError"),
                ),
        )
        .state(
            StateBuilder::new("confirmSeed")
                .on("SEED_MATCHED", TransitionBuilder::to("finalizingWallet"))
                .on("BACK", TransitionBuilder::to("writeSeed"))
                .on(
                    "ERROR",
                    TransitionBuilder::to("confirmSeed").assign("assignCreateWalletError"),
                ),
        )
        .state(
            StateBuilder::new("restoreWallet")
                .on("SEED_RESTORED", TransitionBuilder::to("finalizingWallet"))
                .on("BACK", TransitionBuilder::to("createWalletInit"))
                .on(
                    "ERROR",
                    TransitionBuilder::to("restoreWallet").assign("assignCreateWalletError"),
                ),
        )
        .state(StateBuilder::new("finalizingWallet"))
        .build()
        .expect("createWallet machine document is well-formed")
}

/// Register the guards and actions the document references.
pub fn register(registry: &mut HandlerRegistry) {
    registry
        .register_guard("isNewWallet", |ctx, _| Ok(ctx.flag("isNew")))
        .register_guard("isRestoreWallet", |ctx, _| Ok(!ctx.flag("isNew")))
        .register_action("assignCreateWalletError", |_, event| {
            Ok(patch! { "error": event_value(event, "error") })
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Event;
    use crate::interpreter::Interpreter;
    use serde_json::json;
    use std::sync::Arc;

    fn interpreter_with(context: crate::core::Context) -> Interpreter {
        let mut registry = HandlerRegistry::new();
        register(&mut registry);
        let mut interpreter =
            Interpreter::with_context(Arc::new(machine()), Arc::new(registry), context).unwrap();
        interpreter.start().unwrap();
        interpreter
    }

    #[test]
    fn new_wallet_takes_the_seed_path() {
        let mut interpreter = interpreter_with(context! { "isNew": true });

        let snapshot = interpreter.send(Event::new("CONTINUE")).unwrap();
        assert!(snapshot.matches("writeSeed"));

        interpreter.send(Event::new("SEED_COPIED")).unwrap();
        let snapshot = interpreter.send(Event::new("SEED_MATCHED")).unwrap();
        assert!(snapshot.matches("finalizingWallet"));
    }

    #[test]
    fn existing_wallet_takes_the_restore_path() {
        let mut interpreter = interpreter_with(context! { "isNew": false });

        let snapshot = interpreter.send(Event::new("CONTINUE")).unwrap();
        assert!(snapshot.matches("restoreWallet"));
    }

    #[test]
    fn error_event_stores_the_message_and_stays_put() {
        let mut interpreter = interpreter_with(context! { "isNew": true });

        let snapshot = interpreter
            .send(Event::with_payload("ERROR", json!({ "error": "disk full" })))
            .unwrap();
        assert!(snapshot.matches("createWalletInit"));
        assert_eq!(snapshot.context.get("error"), Some(&json!("disk full")));
    }
}
