// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::countdown::Countdown;
use crate::{
    parse_secret_number, Operation, TickOutcome, WorkflowError, WorkflowSnapshot, WorkflowState,
};
use alloy::primitives::B256;
use snb_config::WorkflowConfig;
use snb_evm_helpers::contracts::{SecretBoardGateway, TxConfirmation};
use snb_evm_helpers::wallet::{signature_to_hex, Wallet};
use snb_fhevm::{
    DecryptionValidity, FhevmClient, FhevmConfig, FhevmError, FhevmInstance, FhevmSdk,
    HandleContractPair,
    UserDecryptRequest,
};
use std::fmt::Display;
use std::future::Future;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// A connected wallet together with the board contract it signs transactions for
#[derive(Clone)]
pub struct Connection {
    pub wallet: Arc<dyn Wallet>,
    pub board: Arc<dyn SecretBoardGateway>,
}

struct SessionState {
    snapshot: WorkflowSnapshot,
    connection: Option<Connection>,
    countdown: Option<Countdown>,
    countdown_generation: u64,
}

impl SessionState {
    fn cancel_countdown(&mut self) {
        self.countdown_generation += 1;
        if let Some(countdown) = self.countdown.take() {
            debug!(generation = countdown.generation(), "Cancelling countdown");
            countdown.cancel();
        }
    }

    fn connection(&self) -> Result<Connection, WorkflowError> {
        self.connection.clone().ok_or(WorkflowError::NotConnected)
    }
}

struct Inner {
    client: FhevmClient,
    settings: WorkflowConfig,
    state: Mutex<SessionState>,
    updates: watch::Sender<WorkflowSnapshot>,
}

/// Drives one wallet session through initialize, submit, sync delay and decrypt.
///
/// Every operation checks its guards and moves into its in-flight state under one short-held
/// lock before the first await, so a second trigger of the same kind is refused with
/// [`WorkflowError::AlreadyInFlight`] instead of prompting the wallet again. Results of calls
/// that complete after the session ended are dropped.
pub struct WorkflowController {
    inner: Arc<Inner>,
}

impl WorkflowController {
    pub fn new(sdk: Arc<dyn FhevmSdk>, fhevm: FhevmConfig, settings: WorkflowConfig) -> Self {
        let (updates, _) = watch::channel(WorkflowSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                client: FhevmClient::new(sdk, fhevm),
                settings,
                state: Mutex::new(SessionState {
                    snapshot: WorkflowSnapshot::default(),
                    connection: None,
                    countdown: None,
                    countdown_generation: 0,
                }),
                updates,
            }),
        }
    }

    pub fn settings(&self) -> &WorkflowConfig {
        &self.inner.settings
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        self.inner.updates.borrow().clone()
    }

    /// Receive every state change
    pub fn subscribe(&self) -> watch::Receiver<WorkflowSnapshot> {
        self.inner.updates.subscribe()
    }

    /// Start a session for `connection`, ending any previous one.
    ///
    /// With `resume_existing` set, a user who already has a value on the board goes straight to
    /// [`WorkflowState::DecryptReady`].
    pub async fn connect(&self, connection: Connection) {
        let address = connection.wallet.address();
        let board = connection.board.clone();
        self.inner.client.teardown();
        let session = self.inner.update(|state| {
            state.cancel_countdown();
            state.connection = Some(connection);
            state.snapshot = WorkflowSnapshot {
                session: state.snapshot.session + 1,
                wallet: Some(address),
                state: WorkflowState::Uninitialized,
                ..Default::default()
            };
            state.snapshot.session
        });
        info!(%address, session, "Wallet connected");

        if !self.inner.settings.resume_existing {
            return;
        }

        match self
            .inner
            .bounded("hasUserSubmitted", board.has_user_submitted(address))
            .await
        {
            Ok(true) => self.inner.update(|state| {
                let resumable = matches!(
                    state.snapshot.state,
                    WorkflowState::Uninitialized
                        | WorkflowState::InitFailed
                        | WorkflowState::AwaitingInput
                );
                if state.snapshot.session == session && resumable {
                    info!(%address, "Found an existing submission, decryption is available");
                    state.snapshot.state = WorkflowState::DecryptReady;
                }
            }),
            Ok(false) => debug!(%address, "No existing submission"),
            Err(e) => warn!("Could not check for an existing submission: {e}"),
        }
    }

    /// End the session. Pending results are discarded and the FHEVM client is dropped.
    pub fn disconnect(&self) {
        self.inner.update(|state| {
            state.cancel_countdown();
            state.connection = None;
            state.snapshot = WorkflowSnapshot {
                session: state.snapshot.session + 1,
                ..Default::default()
            };
        });
        self.inner.client.teardown();
        info!("Wallet disconnected");
    }

    pub fn shutdown(self) {
        self.disconnect();
        info!("Workflow controller shut down");
    }

    /// Create the FHEVM client, or join the creation already in flight.
    pub async fn initialize(&self) -> Result<Arc<dyn FhevmInstance>, WorkflowError> {
        let (session, connection, drive) = self.inner.update(|state| -> Result<_, WorkflowError> {
            let connection = state.connection()?;
            let drive = matches!(
                state.snapshot.state,
                WorkflowState::Uninitialized | WorkflowState::InitFailed
            );
            if drive {
                state.snapshot.state = WorkflowState::Initializing;
                state.snapshot.initialization_error = None;
            }
            Ok((state.snapshot.session, connection, drive))
        })?;

        let next = drive.then_some(WorkflowState::AwaitingInput);
        self.inner
            .init_instance(session, &connection, Operation::Initialize, next)
            .await
    }

    /// Validate, encrypt and store `raw` on the board, then start the sync delay.
    pub async fn submit(&self, raw: &str) -> Result<TxConfirmation, WorkflowError> {
        let (session, connection, value, needs_init) =
            self.inner.update(|state| -> Result<_, WorkflowError> {
                let connection = state.connection()?;
                let needs_init = match state.snapshot.state {
                    WorkflowState::AwaitingInput => false,
                    WorkflowState::Uninitialized | WorkflowState::InitFailed => true,
                    WorkflowState::Submitting { .. } => {
                        warn!("Ignoring submit while a submission is in flight");
                        return Err(WorkflowError::AlreadyInFlight(Operation::Submit));
                    }
                    WorkflowState::Initializing => {
                        return Err(WorkflowError::AlreadyInFlight(Operation::Initialize));
                    }
                    other => {
                        return Err(WorkflowError::InvalidTransition {
                            operation: Operation::Submit,
                            state: other.to_string(),
                        })
                    }
                };

                let value = match parse_secret_number(raw) {
                    Ok(value) => value,
                    Err(e) => {
                        warn!("Rejected input: {e}");
                        state.snapshot.submission_error = Some(e.to_string());
                        return Err(e.into());
                    }
                };

                state.snapshot.raw_input = Some(value);
                state.snapshot.submission_error = None;
                state.snapshot.state = if needs_init {
                    state.snapshot.initialization_error = None;
                    WorkflowState::Initializing
                } else {
                    WorkflowState::Submitting { value }
                };
                Ok((state.snapshot.session, connection, value, needs_init))
            })?;

        let next = needs_init.then_some(WorkflowState::Submitting { value });
        let instance = match self
            .inner
            .init_instance(session, &connection, Operation::Submit, next)
            .await
        {
            Ok(instance) => instance,
            Err(e) => {
                if !needs_init {
                    self.inner.finish(session, |state| {
                        state.snapshot.state = WorkflowState::AwaitingInput;
                        state.snapshot.submission_error = Some(e.to_string());
                    });
                }
                return Err(e);
            }
        };

        let result = self.inner.encrypt_and_send(&instance, &connection, value).await;

        self.inner
            .finish(session, |state| match result {
                Ok(confirmation) => {
                    info!(tx_hash = %confirmation.tx_hash, "Submission confirmed");
                    self.inner.enter_sync(state);
                    Ok(confirmation)
                }
                Err(message) => {
                    let e = WorkflowError::Submission(message);
                    error!("{e}");
                    state.snapshot.state = WorkflowState::AwaitingInput;
                    state.snapshot.submission_error = Some(e.to_string());
                    Err(e)
                }
            })
            .unwrap_or(Err(WorkflowError::SessionEnded(Operation::Submit)))
    }

    /// Advance the sync delay by one second. The countdown timer calls this on its own; hosts
    /// that drive their own clock may call it directly.
    pub fn tick(&self) -> TickOutcome {
        let generation = self.inner.lock().countdown_generation;
        self.inner.tick(generation)
    }

    /// Fetch the caller's handle, authorize a user decryption with an EIP-712 signature and
    /// return the plaintext.
    ///
    /// On a resumed session the FHEVM client may not exist yet. It is then created first while
    /// the snapshot already shows [`WorkflowState::Decrypting`] and `sdk_ready` is false; an
    /// initialization failure is reported as the decryption error.
    pub async fn decrypt(&self) -> Result<u32, WorkflowError> {
        let (session, connection) = self.inner.update(|state| -> Result<_, WorkflowError> {
            let connection = state.connection()?;
            match state.snapshot.state {
                WorkflowState::DecryptReady => {}
                WorkflowState::Decrypting => {
                    warn!("Ignoring decrypt while a decryption is in flight");
                    return Err(WorkflowError::AlreadyInFlight(Operation::Decrypt));
                }
                WorkflowState::Decrypted { .. } => {
                    return Err(WorkflowError::InvalidTransition {
                        operation: Operation::Decrypt,
                        state: state.snapshot.state.to_string(),
                    })
                }
                _ => return Err(WorkflowError::NotEligible),
            }
            state.snapshot.state = WorkflowState::Decrypting;
            state.snapshot.decryption_error = None;
            Ok((state.snapshot.session, connection))
        })?;

        let result = match self
            .inner
            .init_instance(session, &connection, Operation::Decrypt, None)
            .await
        {
            Ok(instance) => self
                .inner
                .authorize_and_decrypt(&instance, &connection)
                .await
                .map_err(WorkflowError::Decryption),
            Err(e) => Err(e),
        };

        self.inner
            .finish(session, |state| match result {
                Ok(value) => {
                    info!("Decryption succeeded");
                    state.snapshot.state = WorkflowState::Decrypted { value };
                    Ok(value)
                }
                Err(e) => {
                    error!("{e}");
                    state.snapshot.state = WorkflowState::DecryptReady;
                    state.snapshot.decryption_error = Some(e.to_string());
                    Err(e)
                }
            })
            .unwrap_or(Err(WorkflowError::SessionEnded(Operation::Decrypt)))
    }

    /// Clear submission, countdown and decrypted value. The FHEVM client is kept.
    pub fn reset(&self) -> Result<(), WorkflowError> {
        self.inner.update(|state| -> Result<(), WorkflowError> {
            state.connection()?;
            match state.snapshot.state {
                WorkflowState::Decrypted { .. }
                | WorkflowState::DecryptReady
                | WorkflowState::AwaitingSync { .. }
                | WorkflowState::AwaitingInput => {}
                WorkflowState::Submitting { .. } => {
                    return Err(WorkflowError::AlreadyInFlight(Operation::Submit))
                }
                WorkflowState::Decrypting => {
                    return Err(WorkflowError::AlreadyInFlight(Operation::Decrypt))
                }
                other => {
                    return Err(WorkflowError::InvalidTransition {
                        operation: Operation::Reset,
                        state: other.to_string(),
                    })
                }
            }

            state.cancel_countdown();
            let sdk_ready = self.inner.client.is_initialized();
            state.snapshot.sdk_ready = sdk_ready;
            state.snapshot.state = if sdk_ready {
                WorkflowState::AwaitingInput
            } else {
                WorkflowState::Uninitialized
            };
            state.snapshot.raw_input = None;
            state.snapshot.submission_error = None;
            state.snapshot.decryption_error = None;
            info!("Workflow reset");
            Ok(())
        })
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutate the session under the lock and publish the new snapshot if it changed
    fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.lock();
        let result = f(&mut state);
        self.updates.send_if_modified(|current| {
            if *current != state.snapshot {
                *current = state.snapshot.clone();
                true
            } else {
                false
            }
        });
        result
    }

    /// Like [`Inner::update`] but only if `session` is still the current one
    fn finish<R>(&self, session: u64, f: impl FnOnce(&mut SessionState) -> R) -> Option<R> {
        self.update(|state| {
            if state.snapshot.session != session {
                warn!(session, "Dropping result of a session that has ended");
                return None;
            }
            Some(f(state))
        })
    }

    async fn bounded<T, E, F>(&self, what: &str, call: F) -> Result<T, String>
    where
        E: Display,
        F: Future<Output = Result<T, E>>,
    {
        match self.settings.call_timeout() {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result.map_err(|e| format!("{e:#}")),
                Err(_) => Err(format!("{what} timed out after {}s", limit.as_secs())),
            },
            None => call.await.map_err(|e| format!("{e:#}")),
        }
    }

    /// Get the FHEVM instance, creating it if needed. When `next` is given and the session is
    /// still `Initializing`, success moves it to `next` and failure to `InitFailed`.
    async fn init_instance(
        &self,
        session: u64,
        connection: &Connection,
        operation: Operation,
        next: Option<WorkflowState>,
    ) -> Result<Arc<dyn FhevmInstance>, WorkflowError> {
        let result = match connection.wallet.network() {
            Some(network) => {
                self.bounded("FHEVM initialization", self.client.get_or_init(&network))
                    .await
            }
            None => Err(FhevmError::ProviderMissing.to_string()),
        };

        self.finish(session, |state| {
            state.snapshot.sdk_ready = self.client.is_initialized();
            let driving = next.is_some() && state.snapshot.state == WorkflowState::Initializing;
            match result {
                Ok(instance) => {
                    if let (true, Some(next)) = (driving, next) {
                        state.snapshot.state = next;
                    }
                    Ok(instance)
                }
                Err(message) => {
                    error!("FHEVM initialization failed: {message}");
                    state.snapshot.initialization_error = Some(message.clone());
                    if driving {
                        state.snapshot.state = WorkflowState::InitFailed;
                    }
                    Err(WorkflowError::Initialization(message))
                }
            }
        })
        .unwrap_or(Err(WorkflowError::SessionEnded(operation)))
    }

    async fn encrypt_and_send(
        &self,
        instance: &Arc<dyn FhevmInstance>,
        connection: &Connection,
        value: u32,
    ) -> Result<TxConfirmation, String> {
        let contract = connection.board.contract_address();
        let user = connection.wallet.address();

        info!(%contract, %user, "Encrypting value");
        let mut input = instance.create_encrypted_input(contract, user);
        input.add32(value);
        let encrypted = self.bounded("encrypt", input.encrypt()).await?;
        let handle = *encrypted
            .handles
            .first()
            .ok_or_else(|| "encryption produced no handle".to_string())?;
        debug!(%handle, proof_len = encrypted.input_proof.len(), "Encrypted input ready");

        info!("Submitting to contract and waiting for confirmation");
        self.bounded(
            "submitMessage",
            connection
                .board
                .submit_message(handle, encrypted.input_proof),
        )
        .await
    }

    async fn authorize_and_decrypt(
        &self,
        instance: &Arc<dyn FhevmInstance>,
        connection: &Connection,
    ) -> Result<u32, String> {
        let contract = connection.board.contract_address();
        let user = connection.wallet.address();

        info!("Fetching encrypted handle");
        let handle = self
            .bounded("getMyMessage", connection.board.get_my_message(user))
            .await?;
        if handle == B256::ZERO {
            return Err("no value is stored for this account".to_string());
        }
        debug!(%handle, "Fetched handle");

        let keypair = instance.generate_keypair();
        let validity = DecryptionValidity::starting_now(self.settings.decrypt_duration_days);
        let contract_addresses = vec![contract];
        let payload = instance
            .create_eip712(&keypair.public_key, &contract_addresses, &validity)
            .without_domain_type();

        info!("Requesting signature");
        let signature = self
            .bounded("signTypedData", connection.wallet.sign_typed_data(&payload))
            .await?;

        info!("Requesting user decryption");
        let request = UserDecryptRequest {
            handle_contract_pairs: vec![HandleContractPair {
                handle,
                contract_address: contract,
            }],
            keypair,
            signature: signature_to_hex(&signature),
            contract_addresses,
            user_address: user,
            validity,
        };
        let values = self
            .bounded("userDecrypt", instance.user_decrypt(request))
            .await?;

        let plaintext = values
            .get(&handle)
            .ok_or_else(|| format!("no plaintext returned for handle {handle}"))?;
        u32::try_from(*plaintext)
            .map_err(|_| format!("decrypted value {plaintext} does not fit in 32 bits"))
    }

    /// Called under the lock once a submission is confirmed
    fn enter_sync(self: &Arc<Self>, state: &mut SessionState) {
        state.cancel_countdown();
        let delay = self.settings.sync_delay_secs;
        if delay == 0 {
            state.snapshot.state = WorkflowState::DecryptReady;
            return;
        }

        info!(delay, "Waiting for permissions to sync before decryption");
        state.snapshot.state = WorkflowState::AwaitingSync {
            remaining_secs: delay,
        };
        let inner = Arc::downgrade(self);
        state.countdown = Some(Countdown::start(
            state.countdown_generation,
            move |generation| match inner.upgrade().map(|inner| inner.tick(generation)) {
                Some(TickOutcome::Counting { .. }) => ControlFlow::Continue(()),
                _ => ControlFlow::Break(()),
            },
        ));
    }

    fn tick(&self, generation: u64) -> TickOutcome {
        self.update(|state| {
            if generation != state.countdown_generation {
                warn!(generation, "Ignoring stale countdown tick");
                return TickOutcome::Ignored;
            }
            let WorkflowState::AwaitingSync { remaining_secs } = state.snapshot.state else {
                debug!("Ignoring tick outside of the sync delay");
                return TickOutcome::Ignored;
            };

            let remaining_secs = remaining_secs.saturating_sub(1);
            if remaining_secs == 0 {
                state.snapshot.state = WorkflowState::DecryptReady;
                state.countdown.take();
                info!("Sync delay elapsed, decryption available");
                TickOutcome::Eligible
            } else {
                state.snapshot.state = WorkflowState::AwaitingSync { remaining_secs };
                TickOutcome::Counting { remaining_secs }
            }
        })
    }
}
