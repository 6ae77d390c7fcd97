//! Wallet setup child machine.
//!
//! Spawned by `getStarted` once a wallet is open, to walk the user through
//! the remaining configuration: fetching the list of voting service
//! providers, picking one, and optionally configuring the ticket autobuyer.
//! Its context is projected from the parent's: the selected wallet and the
//! flags that decide which steps apply.

use crate::builder::{MachineBuilder, StateBuilder, TransitionBuilder};
use crate::core::MachineDefinition;
use crate::registry::HandlerRegistry;
use crate::workflows::event_value;
use crate::{context, patch};

/// The `setupWalletConfig` machine document.
pub fn machine() -> MachineDefinition {
    MachineBuilder::new("setupWalletConfig")
        .initial("fetchingVspList")
        .context(context! {
            "selectedWallet": null,
            "isCreateNewWallet": null,
            "isWatchingOnly": null,
            "isTrezor": null,
            "passPhrase": null,
            "availableVsps": null,
            "selectedVsp": null,
            "error": null,
        })
        .state(
            StateBuilder::new("fetchingVspList")
                .on(
                    "VSP_LIST_FETCHED",
                    TransitionBuilder::to("choosingVsp").assign("assignAvailableVsps"),
                )
                .on(
                    "ERROR_FETCHING_VSP_LIST",
                    TransitionBuilder::to("vspError").assign("assignVspError"),
                ),
        )
        .state(StateBuilder::new("vspError").on("RETRY", TransitionBuilder::to("fetchingVspList")))
        .state(
            StateBuilder::new("choosingVsp")
                .on(
                    "VSP_SELECTED",
                    TransitionBuilder::to("configuringAutobuyer").assign("assignSelectedVsp"),
                )
                .on("SKIP", TransitionBuilder::to("finished")),
        )
        .state(
            StateBuilder::new("configuringAutobuyer")
                .on("CONTINUE", TransitionBuilder::to("finished"))
                .on("BACK", TransitionBuilder::to("choosingVsp")),
        )
        .state(StateBuilder::new("finished"))
        .build()
        .expect("setupWalletConfig machine document is well-formed")
}

/// Register the actions the document references.
pub fn register(registry: &mut HandlerRegistry) {
    registry
        .register_action("assignAvailableVsps", |_, event| {
            Ok(patch! { "availableVsps": event_value(event, "vsps") })
        })
        .register_action("assignVspError", |_, event| {
            Ok(patch! { "error": event_value(event, "error") })
        })
        .register_action("assignSelectedVsp", |_, event| {
            Ok(patch! { "selectedVsp": event_value(event, "vsp") })
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Event;
    use crate::interpreter::Interpreter;
    use serde_json::json;
    use std::sync::Arc;

    fn started_interpreter() -> Interpreter {
        let mut registry = HandlerRegistry::new();
        register(&mut registry);
        let mut interpreter =
            Interpreter::new(Arc::new(machine()), Arc::new(registry)).unwrap();
        interpreter.start().unwrap();
        interpreter
    }

    #[test]
    fn fetched_vsps_land_in_context() {
        let mut interpreter = started_interpreter();

        let vsps = json!([{ "host": "vsp1.example.org", "feepercentage": 2 }]);
        let snapshot = interpreter
            .send(Event::with_payload("VSP_LIST_FETCHED", json!({ "vsps": vsps })))
            .unwrap();

        assert!(snapshot.matches("choosingVsp"));
        assert!(snapshot.context.get("availableVsps").unwrap().is_array());
    }

    #[test]
    fn fetch_failure_routes_to_the_error_state_and_back() {
        let mut interpreter = started_interpreter();

        let snapshot = interpreter
            .send(Event::with_payload(
                "ERROR_FETCHING_VSP_LIST",
                json!({ "error": "timeout" }),
            ))
            .unwrap();
        assert!(snapshot.matches("vspError"));
        assert_eq!(snapshot.context.get("error"), Some(&json!("timeout")));

        let snapshot = interpreter.send(Event::new("RETRY")).unwrap();
        assert!(snapshot.matches("fetchingVspList"));
    }

    #[test]
    fn skipping_vsp_selection_finishes_setup() {
        let mut interpreter = started_interpreter();
        interpreter
            .send(Event::with_payload("VSP_LIST_FETCHED", json!({ "vsps": [] })))
            .unwrap();

        let snapshot = interpreter.send(Event::new("SKIP")).unwrap();
        assert!(snapshot.matches("finished"));
    }
}
