//! The application bootstrap machine.
//!
//! `getStarted` drives startup end to end: `startMachine` holds the daemon
//! and wallet startup steps, `creatingWallet` and `settingUpWallet` host
//! spawned child machines, and the remaining top-level states are overlay
//! views that return to the suspended startup step through the
//! `startMachine.hist` history state.
//!
//! Assign policies follow the rule the UI relies on: an event payload
//! field overrides the context value when present (truthy for the daemon
//! flags, merely present for `isNew`), otherwise the prior context value
//! is kept.

use crate::builder::{MachineBuilder, StateBuilder, TransitionBuilder};
use crate::core::{Context, ContextPatch, DefinitionError, MachineDefinition};
use crate::interpreter::Interpreter;
use crate::registry::{HandlerError, HandlerRegistry, SpawnRequest};
use crate::workflows::{create_wallet, event_value, setup_wallet};
use crate::{context, patch};
use serde_json::{json, Value};
use std::sync::Arc;

/// Entry markers the embedding application replaces with view-routing
/// effects. Registered as no-op actions here so the document stands alone.
const ENTRY_MARKERS: &[&str] = &[
    "isAtPreStart",
    "isAtStartSPV",
    "isAtStartingDaemon",
    "isAtDaemonError",
    "isAtStartAdvancedDaemon",
    "isAtConnectingDaemon",
    "isAtCheckNetworkMatch",
    "isAtSyncingDaemon",
    "isAtChoosingWallet",
    "isAtStartWallet",
    "isAtWalletPubpassInput",
    "isAtWalletDiscoverAccountsPassInput",
    "isSyncingRPC",
];

/// The `getStarted` machine document.
pub fn machine() -> MachineDefinition {
    MachineBuilder::new("getStarted")
        .initial("startMachine")
        .context(context! {
            "credentials": {},
            "selectedWallet": null,
            "appdata": null,
            "error": null,
            "availableWalletsError": null,
            "isCreateNewWallet": null,
            "isSPV": null,
            "isAdvancedDaemon": null,
        })
        .state(start_machine())
        .state(
            StateBuilder::new("creatingWallet")
                .initial("creatingWallet")
                .state(StateBuilder::new("creatingWallet").entry_spawn("spawnCreateWallet"))
                .on(
                    "BACK",
                    TransitionBuilder::to("startMachine.choosingWallet")
                        .assign("resetWalletSelection"),
                )
                .on(
                    "WALLET_CREATED",
                    TransitionBuilder::to("startMachine.preStart").assign("finishWalletCreation"),
                )
                .on(
                    "ERROR",
                    TransitionBuilder::to("startMachine.choosingWallet")
                        .assign("abortWalletCreation"),
                ),
        )
        .state(
            StateBuilder::new("settingUpWallet")
                .initial("settingUpWallet")
                .state(StateBuilder::new("settingUpWallet").entry_spawn("spawnSetupWallet")),
        )
        .state(
            StateBuilder::new("releaseNotes")
                .initial("releaseNotes")
                .state(StateBuilder::new("releaseNotes"))
                .on("BACK", TransitionBuilder::to("startMachine.hist")),
        )
        .state(
            StateBuilder::new("trezorConfig")
                .initial("trezorConfig")
                .state(StateBuilder::new("trezorConfig"))
                .on("BACK", TransitionBuilder::to("startMachine.hist"))
                .on("SHOW_TREZOR_CONFIG", TransitionBuilder::to("trezorConfig")),
        )
        .state(
            StateBuilder::new("settings")
                .initial("settings")
                .state(StateBuilder::new("settings"))
                .on("BACK", TransitionBuilder::to("startMachine.hist"))
                .on("SHOW_LOGS", TransitionBuilder::to("logs")),
        )
        .state(
            StateBuilder::new("logs")
                .initial("logs")
                .state(StateBuilder::new("logs"))
                .on("BACK", TransitionBuilder::to("startMachine.hist"))
                .on("SHOW_SETTINGS", TransitionBuilder::to("settings")),
        )
        .build()
        .expect("getStarted machine document is well-formed")
}

/// The daemon and wallet startup steps.
fn start_machine() -> StateBuilder {
    StateBuilder::new("startMachine")
        .initial("preStart")
        .on("SHOW_SETTINGS", TransitionBuilder::to("settings"))
        .on("SHOW_LOGS", TransitionBuilder::to("logs"))
        .on("SHOW_TREZOR_CONFIG", TransitionBuilder::to("trezorConfig"))
        .on("SHOW_RELEASE_NOTES", TransitionBuilder::to("releaseNotes"))
        .on("SHOW_CREATE_WALLET", TransitionBuilder::to("creatingWallet"))
        .on(
            "SHOW_SETTING_UP_WALLET",
            TransitionBuilder::to("settingUpWallet"),
        )
        .state(
            StateBuilder::new("preStart")
                .entry_assign("isAtPreStart")
                .on(
                    "START_SPV",
                    TransitionBuilder::to("startSpv")
                        .guard("hasSpvFlag")
                        .assign("assignSpvFromEvent"),
                )
                .on(
                    "START_ADVANCED_DAEMON",
                    TransitionBuilder::to("startAdvancedDaemon")
                        .guard("hasAdvancedDaemonFlag")
                        .assign("assignAdvancedDaemonStart"),
                )
                .on(
                    "START_REGULAR_DAEMON",
                    TransitionBuilder::to("startingDaemon").guard("isRegularDaemonStart"),
                )
                .on(
                    "START_CLI_REMOTE_DAEMON",
                    TransitionBuilder::to("connectingDaemon").guard("hasRemoteCredentials"),
                )
                .on(
                    "CHOOSE_WALLET",
                    TransitionBuilder::to("choosingWallet").assign("assignDaemonStartupChoice"),
                )
                .on(
                    "SUBMIT_CHOOSE_WALLET",
                    TransitionBuilder::to("startingWallet").assign("assignDaemonStartupChoice"),
                ),
        )
        .state(
            StateBuilder::new("startSpv")
                .entry_assign("isAtStartSPV")
                .on("CONTINUE", TransitionBuilder::to("choosingWallet")),
        )
        .state(
            StateBuilder::new("startingDaemon")
                .entry_assign("isAtStartingDaemon")
                .on(
                    "START_ADVANCED_DAEMON",
                    TransitionBuilder::to("startAdvancedDaemon"),
                )
                .on(
                    "CONNECT_DAEMON",
                    TransitionBuilder::to("connectingDaemon").assign("assignDaemonCredentials"),
                )
                .on(
                    "ERROR_STARTING_DAEMON",
                    TransitionBuilder::to("daemonError"),
                ),
        )
        // Routes errors by mode: advanced mode returns to the daemon form,
        // everything else surfaces the error page.
        .state(
            StateBuilder::new("daemonError")
                .entry_assign("isAtDaemonError")
                .on(
                    "START_ADVANCED_DAEMON",
                    TransitionBuilder::to("startAdvancedDaemon").assign("assignErrorFromPayload"),
                ),
        )
        .state(
            StateBuilder::new("startAdvancedDaemon")
                .entry_assign("isAtStartAdvancedDaemon")
                .on("SUBMIT_REMOTE", TransitionBuilder::to("connectingDaemon"))
                .on(
                    "SUBMIT_APPDATA",
                    TransitionBuilder::to("startingDaemon").assign("assignAppdataFromEvent"),
                )
                .on("CONTINUE", TransitionBuilder::to("startingDaemon")),
        )
        .state(
            StateBuilder::new("connectingDaemon")
                .entry_assign("isAtConnectingDaemon")
                .on(
                    "SYNC_DAEMON",
                    TransitionBuilder::to("syncingDaemon").assign("assignErrorFromEvent"),
                )
                .on(
                    "ERROR_CONNECTING_DAEMON",
                    TransitionBuilder::to("daemonError"),
                ),
        )
        .state(
            StateBuilder::new("checkingNetworkMatch")
                .entry_assign("isAtCheckNetworkMatch")
                .on("CHOOSE_WALLET", TransitionBuilder::to("choosingWallet"))
                .on("ERROR_NETWORK_DAEMON", TransitionBuilder::to("daemonError")),
        )
        .state(
            StateBuilder::new("syncingDaemon")
                .entry_assign("isAtSyncingDaemon")
                .on(
                    "CHECK_NETWORK_MATCH",
                    TransitionBuilder::to("checkingNetworkMatch").assign("assignErrorFromEvent"),
                )
                .on("ERROR_SYNCING_DAEMON", TransitionBuilder::to("daemonError")),
        )
        // Creates the wallet directory and config before the creation flow
        // proper takes over.
        .state(
            StateBuilder::new("preCreateWallet")
                .on("BACK", TransitionBuilder::to("choosingWallet"))
                .on(
                    "ERROR",
                    TransitionBuilder::to("preCreateWallet").assign("assignErrorFromEvent"),
                ),
        )
        .state(
            StateBuilder::new("choosingWallet")
                .entry_assign("isAtChoosingWallet")
                .on(
                    "SUBMIT_CHOOSE_WALLET",
                    TransitionBuilder::to("startingWallet").assign("assignChosenWallet"),
                )
                .on(
                    "CREATE_WALLET",
                    TransitionBuilder::to("preCreateWallet").assign("beginWalletCreation"),
                )
                .on(
                    "ERROR",
                    TransitionBuilder::to("choosingWallet").assign("assignWalletChoiceError"),
                )
                .on(
                    "AVAILABLE_WALLET_ERROR",
                    TransitionBuilder::to("choosingWallet").assign("assignAvailableWalletsError"),
                ),
        )
        .state(
            StateBuilder::new("startingWallet")
                .entry_assign("isAtStartWallet")
                .on("SYNC_RPC", TransitionBuilder::to("syncingRPC"))
                .on(
                    "WALLET_PUBPASS_INPUT",
                    TransitionBuilder::to("walletPubpassInput"),
                )
                .on(
                    "WALLET_DISCOVERACCOUNTS_PASS",
                    TransitionBuilder::to("walletDiscoverAccountsPassInput"),
                )
                .on(
                    "ERROR",
                    TransitionBuilder::to("choosingWallet").assign("assignErrorFromEvent"),
                ),
        )
        .state(
            StateBuilder::new("walletPubpassInput")
                .entry_assign("isAtWalletPubpassInput")
                .on(
                    "WALLET_DISCOVERACCOUNTS_PASS",
                    TransitionBuilder::to("walletDiscoverAccountsPassInput"),
                )
                .on("CONTINUE", TransitionBuilder::to("syncingRPC"))
                .on(
                    "ERROR",
                    TransitionBuilder::to("walletPubpassInput").assign("assignErrorFromEvent"),
                ),
        )
        .state(
            StateBuilder::new("walletDiscoverAccountsPassInput")
                .entry_assign("isAtWalletDiscoverAccountsPassInput")
                .on(
                    "SETPASSPHRASE",
                    TransitionBuilder::to("syncingRPC").assign("assignPassPhrase"),
                )
                .on(
                    "ERROR",
                    TransitionBuilder::to("walletDiscoverAccountsPassInput")
                        .assign("assignErrorFromEvent"),
                ),
        )
        .state(
            StateBuilder::new("syncingRPC")
                .entry_assign("isSyncingRPC")
                .on(
                    "WALLET_DISCOVERACCOUNTS_PASS",
                    TransitionBuilder::to("walletDiscoverAccountsPassInput"),
                )
                .on(
                    "ERROR_SYNCING_WALLET",
                    TransitionBuilder::to("choosingWallet").assign("assignErrorFromEvent"),
                ),
        )
        // Lets overlay views return to the step that was active when they
        // opened.
        .state(StateBuilder::history("hist"))
}

/// Handler registry for `getStarted` and both child machines.
pub fn registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    for marker in ENTRY_MARKERS {
        registry.register_action(*marker, |_, _| Ok(ContextPatch::new()));
    }

    registry
        .register_guard("hasSpvFlag", |_, event| Ok(event.flag("isSPV")))
        .register_guard("hasAdvancedDaemonFlag", |_, event| {
            Ok(event.flag("isAdvancedDaemon"))
        })
        .register_guard("isRegularDaemonStart", |_, event| {
            Ok(!event.flag("isAdvancedDaemon") && !event.flag("isSPV"))
        })
        .register_guard("hasRemoteCredentials", |_, event| {
            Ok(event.flag("remoteCredentials"))
        });

    registry
        .register_action("assignSpvFromEvent", |_, event| {
            Ok(if event.flag("isSPV") {
                patch! { "isSPV": true }
            } else {
                ContextPatch::new()
            })
        })
        .register_action("assignAdvancedDaemonStart", |_, event| {
            let mut p = ContextPatch::new();
            if event.flag("isAdvancedDaemon") {
                p = p.set("isAdvancedDaemon", json!(true));
            }
            Ok(p.set("error", event_value(event, "error")))
        })
        .register_action("assignDaemonStartupChoice", |_, event| {
            let mut p = ContextPatch::new();
            if event.flag("isAdvancedDaemon") {
                p = p.set("isAdvancedDaemon", json!(true));
            }
            if event.flag("isSPV") {
                p = p.set("isSPV", json!(true));
            }
            if event.flag("selectedWallet") {
                p = p.set("selectedWallet", event_value(event, "selectedWallet"));
            }
            Ok(p.set("error", event_value(event, "error")))
        })
        .register_action("assignDaemonCredentials", |_, event| {
            let mut p = ContextPatch::new();
            if event.flag("credentials") {
                p = p.set("credentials", event_value(event, "credentials"));
            }
            if event.flag("appdata") {
                p = p.set("appdata", event_value(event, "appdata"));
            }
            Ok(p)
        })
        .register_action("assignErrorFromPayload", |_, event| {
            let error = event
                .field("payload")
                .and_then(|payload| payload.get("error"))
                .cloned()
                .unwrap_or(Value::Null);
            Ok(patch! { "error": error })
        })
        .register_action("assignAppdataFromEvent", |_, event| {
            Ok(if event.flag("appdata") {
                patch! { "appdata": event_value(event, "appdata") }
            } else {
                ContextPatch::new()
            })
        })
        .register_action("assignErrorFromEvent", |_, event| {
            Ok(patch! { "error": event_value(event, "error") })
        })
        .register_action("assignChosenWallet", |_, event| {
            let mut p = ContextPatch::new();
            if event.flag("selectedWallet") {
                p = p.set("selectedWallet", event_value(event, "selectedWallet"));
            }
            Ok(p.set("error", event_value(event, "error")))
        })
        .register_action("beginWalletCreation", |_, event| {
            let mut p = patch! { "error": "" };
            // Presence, not truthiness: an explicit `isNew: false` must win
            // over the prior context value.
            if event.has_field("isNew") {
                p = p.set("isCreateNewWallet", event_value(event, "isNew"));
            }
            Ok(p)
        })
        .register_action("assignWalletChoiceError", |_, event| {
            Ok(patch! {
                "error": event_value(event, "error"),
                "availableWalletsError": "",
            })
        })
        .register_action("assignAvailableWalletsError", |_, event| {
            Ok(patch! {
                "error": "",
                "availableWalletsError": event_value(event, "error"),
            })
        })
        .register_action("assignPassPhrase", |_, event| {
            Ok(patch! { "passPhrase": event_value(event, "passPhrase") })
        })
        .register_action("resetWalletSelection", |_, _| {
            Ok(patch! { "selectedWallet": null, "passPhrase": null })
        })
        .register_action("finishWalletCreation", |_, event| {
            Ok(patch! {
                "error": "",
                "passPhrase": event_value(event, "passPhrase"),
            })
        })
        .register_action("abortWalletCreation", |_, event| {
            Ok(patch! {
                "error": event_value(event, "error"),
                "selectedWallet": null,
                "passPhrase": null,
            })
        });

    let create_wallet_def = Arc::new(create_wallet::machine());
    registry.register_spawner("spawnCreateWallet", move |_, event| {
        Ok(SpawnRequest::new(
            Arc::clone(&create_wallet_def),
            Context::new()
                .with("isNew", event_value(event, "isNew"))
                .with(
                    "walletMasterPubKey",
                    event_value(event, "walletMasterPubKey"),
                )
                .with("isTrezor", event_value(event, "isTrezor")),
        ))
    });

    let setup_wallet_def = Arc::new(setup_wallet::machine());
    registry.register_spawner("spawnSetupWallet", move |ctx, _| {
        let selected = ctx.get("selectedWallet").cloned().unwrap_or(Value::Null);
        let (is_watching_only, is_trezor) = match selected.as_object() {
            Some(wallet) => (
                wallet.get("isWatchingOnly").cloned().unwrap_or(Value::Null),
                wallet.get("isTrezor").cloned().unwrap_or(Value::Null),
            ),
            None => return Err(HandlerError::new("no wallet selected")),
        };
        Ok(SpawnRequest::new(
            Arc::clone(&setup_wallet_def),
            Context::new()
                .with("selectedWallet", selected)
                .with(
                    "isCreateNewWallet",
                    ctx.get("isCreateNewWallet").cloned().unwrap_or(Value::Null),
                )
                .with("isWatchingOnly", is_watching_only)
                .with("isTrezor", is_trezor)
                .with(
                    "passPhrase",
                    ctx.get("passPhrase").cloned().unwrap_or(Value::Null),
                ),
        ))
    });

    create_wallet::register(&mut registry);
    setup_wallet::register(&mut registry);
    registry
}

/// A ready-to-start interpreter over the bootstrap machine.
pub fn interpreter() -> Result<Interpreter, DefinitionError> {
    Interpreter::new(Arc::new(machine()), Arc::new(registry()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Event, StateId};

    fn started() -> Interpreter {
        let mut interpreter = interpreter().unwrap();
        interpreter.start().unwrap();
        interpreter
    }

    fn at_choosing_wallet() -> Interpreter {
        let mut interpreter = started();
        interpreter.send(Event::new("CHOOSE_WALLET")).unwrap();
        interpreter
    }

    #[test]
    fn machine_starts_at_pre_start() {
        let interpreter = started();
        assert_eq!(
            interpreter.snapshot().active,
            vec![StateId::new("startMachine.preStart")]
        );
    }

    #[test]
    fn regular_daemon_start_without_flags() {
        let mut interpreter = started();
        let snapshot = interpreter.send(Event::new("START_REGULAR_DAEMON")).unwrap();
        assert!(snapshot.matches("startMachine.startingDaemon"));
    }

    #[test]
    fn regular_daemon_start_is_guarded_against_flags() {
        let mut interpreter = started();
        let snapshot = interpreter
            .send(Event::with_payload(
                "START_REGULAR_DAEMON",
                json!({ "isSPV": true }),
            ))
            .unwrap();
        // Guard fails at the matching level, so the event is dropped.
        assert!(snapshot.matches("startMachine.preStart"));
    }

    #[test]
    fn daemon_error_keeps_context_error_unset() {
        let mut interpreter = started();
        interpreter.send(Event::new("START_REGULAR_DAEMON")).unwrap();

        let snapshot = interpreter.send(Event::new("ERROR_STARTING_DAEMON")).unwrap();
        assert!(snapshot.matches("startMachine.daemonError"));
        assert_eq!(snapshot.context.get("error"), Some(&json!(null)));
    }

    #[test]
    fn daemon_error_recovers_into_advanced_mode_with_the_reported_error() {
        let mut interpreter = started();
        interpreter.send(Event::new("START_REGULAR_DAEMON")).unwrap();
        interpreter.send(Event::new("ERROR_STARTING_DAEMON")).unwrap();

        let snapshot = interpreter
            .send(Event::with_payload(
                "START_ADVANCED_DAEMON",
                json!({ "payload": { "error": "connection refused" } }),
            ))
            .unwrap();
        assert!(snapshot.matches("startMachine.startAdvancedDaemon"));
        assert_eq!(
            snapshot.context.get("error"),
            Some(&json!("connection refused"))
        );
    }

    #[test]
    fn spv_start_requires_the_flag_and_records_it() {
        let mut interpreter = started();

        let snapshot = interpreter.send(Event::new("START_SPV")).unwrap();
        assert!(snapshot.matches("startMachine.preStart"));

        let snapshot = interpreter
            .send(Event::with_payload("START_SPV", json!({ "isSPV": true })))
            .unwrap();
        assert!(snapshot.matches("startMachine.startSpv"));
        assert_eq!(snapshot.context.get("isSPV"), Some(&json!(true)));
    }

    #[test]
    fn create_wallet_marks_intent_and_clears_the_error() {
        let mut interpreter = at_choosing_wallet();

        let snapshot = interpreter
            .send(Event::with_payload("CREATE_WALLET", json!({ "isNew": true })))
            .unwrap();
        assert!(snapshot.matches("startMachine.preCreateWallet"));
        assert_eq!(snapshot.context.get("isCreateNewWallet"), Some(&json!(true)));
        assert_eq!(snapshot.context.get("error"), Some(&json!("")));
    }

    #[test]
    fn create_wallet_keeps_prior_intent_when_the_event_omits_is_new() {
        let mut interpreter = at_choosing_wallet();
        interpreter
            .send(Event::with_payload("CREATE_WALLET", json!({ "isNew": false })))
            .unwrap();
        interpreter.send(Event::new("BACK")).unwrap();

        let snapshot = interpreter.send(Event::new("CREATE_WALLET")).unwrap();
        assert_eq!(
            snapshot.context.get("isCreateNewWallet"),
            Some(&json!(false))
        );
    }

    #[test]
    fn settings_overlay_returns_through_history() {
        let mut interpreter = at_choosing_wallet();

        let snapshot = interpreter.send(Event::new("SHOW_SETTINGS")).unwrap();
        assert!(snapshot.matches("settings"));

        let snapshot = interpreter.send(Event::new("BACK")).unwrap();
        assert_eq!(
            snapshot.active,
            vec![StateId::new("startMachine.choosingWallet")]
        );
    }

    #[test]
    fn overlays_chain_without_losing_the_suspended_step() {
        let mut interpreter = at_choosing_wallet();
        interpreter.send(Event::new("SHOW_SETTINGS")).unwrap();
        interpreter.send(Event::new("SHOW_LOGS")).unwrap();

        let snapshot = interpreter.send(Event::new("BACK")).unwrap();
        assert_eq!(
            snapshot.active,
            vec![StateId::new("startMachine.choosingWallet")]
        );
    }

    #[test]
    fn overlay_opened_at_pre_start_returns_to_pre_start() {
        let mut interpreter = started();
        interpreter.send(Event::new("SHOW_RELEASE_NOTES")).unwrap();

        let snapshot = interpreter.send(Event::new("BACK")).unwrap();
        assert_eq!(
            snapshot.active,
            vec![StateId::new("startMachine.preStart")]
        );
    }

    #[test]
    fn create_wallet_overlay_spawns_an_actor_with_the_projected_context() {
        let mut interpreter = at_choosing_wallet();
        interpreter
            .send(Event::with_payload(
                "SHOW_CREATE_WALLET",
                json!({ "isNew": false, "walletMasterPubKey": "pk1", "isTrezor": false }),
            ))
            .unwrap();

        let actor = interpreter
            .actor(&StateId::new("creatingWallet.creatingWallet"))
            .unwrap();
        assert!(actor.is_running());

        let child = actor.snapshot().unwrap();
        assert!(child.matches("createWalletInit"));
        assert_eq!(child.context.get("isNew"), Some(&json!(false)));
        assert_eq!(child.context.get("walletMasterPubKey"), Some(&json!("pk1")));
        assert_eq!(child.context.get("isTrezor"), Some(&json!(false)));
        // The projection is exact: nothing of the parent's context leaks in.
        assert!(!child.context.contains("credentials"));
        assert!(!child.context.contains("selectedWallet"));
        assert_eq!(child.context.len(), 3);
    }

    #[test]
    fn wallet_created_returns_to_pre_start_and_stops_the_actor() {
        let mut interpreter = at_choosing_wallet();
        interpreter
            .send(Event::with_payload(
                "SHOW_CREATE_WALLET",
                json!({ "isNew": true }),
            ))
            .unwrap();

        let snapshot = interpreter
            .send(Event::with_payload(
                "WALLET_CREATED",
                json!({ "passPhrase": "hunter2" }),
            ))
            .unwrap();
        assert!(snapshot.matches("startMachine.preStart"));
        assert_eq!(snapshot.context.get("error"), Some(&json!("")));
        assert_eq!(snapshot.context.get("passPhrase"), Some(&json!("hunter2")));
        assert!(interpreter
            .actor(&StateId::new("creatingWallet.creatingWallet"))
            .is_none());
    }

    #[test]
    fn wallet_selection_keeps_prior_value_when_the_event_omits_it() {
        let mut interpreter = started();
        interpreter
            .send(Event::with_payload(
                "CHOOSE_WALLET",
                json!({ "selectedWallet": { "value": { "wallet": "default" } } }),
            ))
            .unwrap();

        // Submitting without a wallet in the payload keeps the earlier pick.
        let snapshot = interpreter.send(Event::new("SUBMIT_CHOOSE_WALLET")).unwrap();
        assert!(snapshot.matches("startMachine.startingWallet"));
        assert_eq!(
            snapshot.context.get("selectedWallet"),
            Some(&json!({ "value": { "wallet": "default" } }))
        );
    }

    #[test]
    fn setting_up_wallet_without_a_selected_wallet_reports_the_spawn_failure() {
        let mut interpreter = started();
        let snapshot = interpreter.send(Event::new("SHOW_SETTING_UP_WALLET")).unwrap();

        assert!(snapshot.matches("settingUpWallet"));
        assert!(interpreter
            .actor(&StateId::new("settingUpWallet.settingUpWallet"))
            .is_none());
        let error = snapshot
            .context
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap();
        assert!(error.contains("no wallet selected"));
    }

    #[test]
    fn setting_up_wallet_projects_the_parent_context_into_the_actor() {
        let mut interpreter = started();
        interpreter
            .send(Event::with_payload(
                "CHOOSE_WALLET",
                json!({ "selectedWallet": { "isWatchingOnly": false, "isTrezor": true } }),
            ))
            .unwrap();

        interpreter.send(Event::new("SHOW_SETTING_UP_WALLET")).unwrap();
        let child = interpreter
            .actor(&StateId::new("settingUpWallet.settingUpWallet"))
            .unwrap()
            .snapshot()
            .unwrap();

        assert!(child.matches("fetchingVspList"));
        assert_eq!(child.context.get("isWatchingOnly"), Some(&json!(false)));
        assert_eq!(child.context.get("isTrezor"), Some(&json!(true)));
    }

    #[test]
    fn wallet_error_routes_back_to_choosing_wallet() {
        let mut interpreter = at_choosing_wallet();
        interpreter
            .send(Event::with_payload(
                "SUBMIT_CHOOSE_WALLET",
                json!({ "selectedWallet": { "wallet": "default" } }),
            ))
            .unwrap();

        let snapshot = interpreter
            .send(Event::with_payload("ERROR", json!({ "error": "wallet locked" })))
            .unwrap();
        assert!(snapshot.matches("startMachine.choosingWallet"));
        assert_eq!(snapshot.context.get("error"), Some(&json!("wallet locked")));
    }

    #[test]
    fn passphrase_entry_reaches_rpc_sync() {
        let mut interpreter = at_choosing_wallet();
        interpreter
            .send(Event::with_payload(
                "SUBMIT_CHOOSE_WALLET",
                json!({ "selectedWallet": { "wallet": "default" } }),
            ))
            .unwrap();
        interpreter
            .send(Event::new("WALLET_DISCOVERACCOUNTS_PASS"))
            .unwrap();

        let snapshot = interpreter
            .send(Event::with_payload(
                "SETPASSPHRASE",
                json!({ "passPhrase": "hunter2" }),
            ))
            .unwrap();
        assert!(snapshot.matches("startMachine.syncingRPC"));
        assert_eq!(snapshot.context.get("passPhrase"), Some(&json!("hunter2")));
    }

    #[test]
    fn document_roundtrips_through_json() {
        let definition = machine();
        let text = serde_json::to_string_pretty(&definition).unwrap();
        let back: MachineDefinition = serde_json::from_str(&text).unwrap();
        assert_eq!(definition, back);
    }

    #[test]
    fn document_validates_against_the_registry() {
        assert!(machine().validate(&registry()).is_ok());
    }
}
