// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{FhevmConfig, FhevmError, FhevmInstance, FhevmSdk, Network};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info};

type InstanceResult = Result<Arc<dyn FhevmInstance>, FhevmError>;
type PendingInstance = Shared<BoxFuture<'static, InstanceResult>>;

enum Slot {
    Empty,
    Pending {
        generation: u64,
        future: PendingInstance,
    },
    Ready(Arc<dyn FhevmInstance>),
}

struct ClientState {
    slot: Slot,
    generation: u64,
}

/// Lazily initialized, single-flight handle to an SDK instance.
///
/// The first caller of [`FhevmClient::get_or_init`] starts `initSDK` + `createInstance`. Every
/// caller arriving while that is in flight joins the same pending future instead of starting a
/// second initialization. A failed attempt leaves the slot empty so the next call retries, and
/// so does a caller that stops waiting (for example on a timeout) before the attempt settles.
pub struct FhevmClient {
    sdk: Arc<dyn FhevmSdk>,
    config: FhevmConfig,
    state: Mutex<ClientState>,
}

impl FhevmClient {
    pub fn new(sdk: Arc<dyn FhevmSdk>, config: FhevmConfig) -> Self {
        Self {
            sdk,
            config,
            state: Mutex::new(ClientState {
                slot: Slot::Empty,
                generation: 0,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state().slot, Slot::Ready(_))
    }

    pub fn is_initializing(&self) -> bool {
        matches!(self.state().slot, Slot::Pending { .. })
    }

    pub async fn get_or_init(&self, network: &Network) -> InstanceResult {
        let (generation, pending) = {
            let mut guard = self.state();
            let state = &mut *guard;
            match &state.slot {
                Slot::Ready(instance) => return Ok(instance.clone()),
                Slot::Pending { generation, future } => {
                    debug!("Joining FHEVM initialization already in flight");
                    (*generation, future.clone())
                }
                Slot::Empty => {
                    state.generation += 1;
                    let generation = state.generation;
                    let future = self.initialize(network.clone());
                    state.slot = Slot::Pending {
                        generation,
                        future: future.clone(),
                    };
                    (generation, future)
                }
            }
        };

        let mut abandon = AbandonOnDrop {
            client: self,
            generation,
            armed: true,
        };
        let result = pending.await;
        abandon.armed = false;

        let mut state = self.state();
        let still_current = matches!(
            &state.slot,
            Slot::Pending { generation: g, .. } if *g == generation
        );
        if !still_current {
            // Torn down (and possibly re-initialized) while we were waiting
            return match (&state.slot, result) {
                (Slot::Ready(instance), _) => Ok(instance.clone()),
                (_, Ok(_)) => Err(FhevmError::TornDown),
                (_, Err(e)) => Err(e),
            };
        }
        state.slot = match &result {
            Ok(instance) => Slot::Ready(instance.clone()),
            Err(_) => Slot::Empty,
        };
        result
    }

    fn initialize(&self, network: Network) -> PendingInstance {
        let sdk = self.sdk.clone();
        let config = self.config.clone();
        async move {
            info!(chain_id = config.chain_id, "Initializing FHEVM client");
            if let Err(e) = sdk.init_sdk().await {
                error!("FHEVM SDK initialization failed: {e}");
                return Err(e);
            }
            match sdk.create_instance(&config, &network).await {
                Ok(instance) => {
                    info!("FHEVM client ready");
                    Ok(instance)
                }
                Err(e) => {
                    error!("FHEVM instance creation failed: {e}");
                    Err(e)
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Drop the instance. In-flight initializations complete but their result is discarded.
    pub fn teardown(&self) {
        let mut state = self.state();
        state.generation += 1;
        state.slot = Slot::Empty;
        debug!("FHEVM client torn down");
    }
}

/// Clears the pending slot of `generation` when the waiting caller is dropped early
struct AbandonOnDrop<'a> {
    client: &'a FhevmClient,
    generation: u64,
    armed: bool,
}

impl Drop for AbandonOnDrop<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.client.state();
        let abandoned = matches!(
            &state.slot,
            Slot::Pending { generation, .. } if *generation == self.generation
        );
        if abandoned {
            debug!(
                generation = self.generation,
                "Abandoning pending FHEVM initialization"
            );
            state.slot = Slot::Empty;
        }
    }
}
