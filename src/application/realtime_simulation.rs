//! Debounced simulation of the current allocation while the user edits it

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::store::{SharedStore, SubscriptionId};
use crate::infrastructure::api::OptimizerApi;
use crate::shared::types::SimulationRequest;

/// Trigger configuration
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    pub quiet_period_ms: u64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            quiet_period_ms: 500,
        }
    }
}

impl TriggerConfig {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }
}

/// Runs a simulation once the simulation inputs stop changing.
///
/// Every change to chain, voting power, selection or allocations cancels the
/// pending timer. A new one is armed only when the state can be simulated.
/// The request is built from the state at firing time and runs as its own
/// task, so overlapping requests are possible and the last to resolve wins.
pub struct SimulationTrigger {
    store: SharedStore,
    subscription: SubscriptionId,
    task: JoinHandle<()>,
    in_flight: Arc<AtomicUsize>,
}

impl SimulationTrigger {
    pub async fn start(store: SharedStore, api: Arc<dyn OptimizerApi>, config: TriggerConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<bool>();

        let subscription = {
            let mut guard = store.write().await;
            // Evaluate the state as it is right now
            let _ = tx.send(guard.state().can_simulate());
            guard.subscribe(move |state, change| {
                if change.affects_simulation() {
                    let _ = tx.send(state.can_simulate());
                }
            })
        };

        let in_flight = Arc::new(AtomicUsize::new(0));
        let task = tokio::spawn(debounce_loop(
            rx,
            store.clone(),
            api,
            config.quiet_period(),
            in_flight.clone(),
        ));

        info!(quiet_ms = config.quiet_period_ms, "🔍 Real-time simulation enabled");
        Self {
            store,
            subscription,
            task,
            in_flight,
        }
    }

    /// True while at least one simulate request is outstanding
    pub fn is_simulating(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub async fn shutdown(self) {
        self.store.write().await.unsubscribe(self.subscription);
        self.task.abort();
    }
}

impl Drop for SimulationTrigger {
    fn drop(&mut self) {
        self.task.abort();
        let subscription = self.subscription;
        match self.store.try_write() {
            Ok(mut store) => {
                store.unsubscribe(subscription);
            }
            // Lock held elsewhere: unsubscribe once it is released
            Err(_) => match Handle::try_current() {
                Ok(handle) => {
                    let store = self.store.clone();
                    handle.spawn(async move {
                        store.write().await.unsubscribe(subscription);
                    });
                }
                Err(_) => warn!(?subscription, "no runtime at drop, simulation listener left registered"),
            },
        }
    }
}

async fn debounce_loop(
    mut rx: mpsc::UnboundedReceiver<bool>,
    store: SharedStore,
    api: Arc<dyn OptimizerApi>,
    quiet_period: Duration,
    in_flight: Arc<AtomicUsize>,
) {
    let mut armed = false;
    loop {
        let timer = async move {
            if armed {
                sleep(quiet_period).await
            } else {
                std::future::pending::<()>().await
            }
        };

        tokio::select! {
            ready = rx.recv() => match ready {
                Some(ready) => armed = ready,
                None => break,
            },
            _ = timer => {
                armed = false;
                dispatch(store.clone(), api.clone(), in_flight.clone()).await;
            }
        }
    }
    debug!("simulation trigger stopped");
}

/// Builds the request from the current state and spawns it
async fn dispatch(store: SharedStore, api: Arc<dyn OptimizerApi>, in_flight: Arc<AtomicUsize>) {
    let (chain, request) = {
        let guard = store.read().await;
        let state = guard.state();
        if !state.can_simulate() {
            return;
        }
        (
            state.selected_chain,
            SimulationRequest {
                pools: state.selected_pools.clone(),
                weights: state.selected_weights_bps(),
                voting_power: state.voting_power,
            },
        )
    };

    let request_id = Uuid::new_v4();
    debug!(%request_id, %chain, pools = request.pools.len(), "dispatching simulation");
    in_flight.fetch_add(1, Ordering::SeqCst);

    tokio::spawn(async move {
        let outcome = api.simulate_vote(chain, &request).await;
        let mut guard = store.write().await;
        match outcome {
            Ok(result) => {
                debug!(%request_id, total = result.total_expected_return, "simulation resolved");
                guard.set_simulation(Some(result));
                guard.set_optimization(None);
            }
            Err(err) => {
                warn!(%request_id, error = %err, "⚠️ Real-time simulation failed");
                guard.set_error(Some(err.message));
            }
        }
        drop(guard);
        in_flight.fetch_sub(1, Ordering::SeqCst);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{even_result, MockApi};
    use crate::domain::store::OptimizerStore;
    use crate::shared::types::{MultiOptimizationEntry, OptimizationResult};

    async fn trigger(api: Arc<MockApi>) -> (SharedStore, SimulationTrigger) {
        let store = OptimizerStore::new().shared();
        let trigger = SimulationTrigger::start(store.clone(), api, TriggerConfig::default()).await;
        (store, trigger)
    }

    async fn wait_ms(ms: u64) {
        sleep(Duration::from_millis(ms)).await;
    }

    async fn select_full(store: &SharedStore) {
        let mut guard = store.write().await;
        guard.toggle_pool_selection("0xA");
        guard.toggle_pool_selection("0xB");
        guard.set_pool_allocation("0xA", 60.0);
        guard.set_pool_allocation("0xB", 40.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_edits_simulates_once() {
        let api = Arc::new(MockApi::default());
        let (store, _trigger) = trigger(api.clone()).await;

        select_full(&store).await;
        wait_ms(300).await;
        store.write().await.set_pool_allocation("0xA", 60.0);
        wait_ms(300).await;
        store.write().await.set_voting_power(2_000_000.0);
        wait_ms(499).await;
        assert_eq!(api.simulate_count(), 0);

        wait_ms(10).await;
        assert_eq!(api.simulate_count(), 1);
        let (_, request) = api.last_simulation().unwrap();
        assert_eq!(request.weights, vec![6000, 4000]);
        assert_eq!(request.voting_power, 2_000_000.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_incomplete_allocation_cancels_pending_timer() {
        let api = Arc::new(MockApi::default());
        let (store, _trigger) = trigger(api.clone()).await;

        select_full(&store).await;
        wait_ms(200).await;
        store.write().await.set_pool_allocation("0xB", 30.0);
        wait_ms(2_000).await;
        assert_eq!(api.simulate_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrelated_changes_do_not_rearm() {
        let api = Arc::new(MockApi::default());
        let (store, _trigger) = trigger(api.clone()).await;

        select_full(&store).await;
        wait_ms(300).await;
        store.write().await.set_max_pools(7);
        store.write().await.toggle_blacklist("0xC");
        wait_ms(210).await;
        assert_eq!(api.simulate_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_replaces_optimization_and_keeps_multi_results() {
        let api = Arc::new(MockApi::default());
        let (store, _trigger) = trigger(api.clone()).await;
        {
            let mut guard = store.write().await;
            guard.set_optimization(Some(OptimizationResult::default()));
            guard.set_multi_optimization_results(vec![MultiOptimizationEntry {
                max_pools: 2,
                result: even_result(2, 10.0),
            }]);
        }

        select_full(&store).await;
        wait_ms(600).await;

        let guard = store.read().await;
        let state = guard.state();
        assert_eq!(state.current_simulation.as_ref().unwrap().total_expected_return, 123.0);
        assert!(state.current_optimization.is_none());
        assert_eq!(state.multi_optimization_results.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_sets_store_error() {
        let api = Arc::new(MockApi::failing_simulation("Simulation failed: upstream", 502));
        let (store, _trigger) = trigger(api.clone()).await;

        select_full(&store).await;
        wait_ms(600).await;

        let guard = store.read().await;
        assert_eq!(guard.state().error.as_deref(), Some("Simulation failed: upstream"));
        assert!(guard.state().current_simulation.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_valid_state_at_start_is_simulated() {
        let api = Arc::new(MockApi::default());
        let store = OptimizerStore::new().shared();
        select_full(&store).await;

        let _trigger = SimulationTrigger::start(store.clone(), api.clone(), TriggerConfig::default()).await;
        wait_ms(600).await;
        assert_eq!(api.simulate_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_requests_last_response_wins() {
        let mut api = MockApi::default();
        api.simulate_delay = Some(Duration::from_millis(1_000));
        let api = Arc::new(api);
        let config = TriggerConfig { quiet_period_ms: 100 };
        let store = OptimizerStore::new().shared();
        let trigger = SimulationTrigger::start(store.clone(), api.clone(), config).await;

        select_full(&store).await;
        wait_ms(150).await;
        assert!(trigger.is_simulating());

        *api.simulation.lock().unwrap() = Ok(even_result(2, 999.0));
        store.write().await.set_pool_allocation("0xA", 60.0);
        wait_ms(150).await;
        assert_eq!(api.simulate_count(), 2);

        wait_ms(2_000).await;
        assert!(!trigger.is_simulating());
        let guard = store.read().await;
        assert_eq!(guard.state().current_simulation.as_ref().unwrap().total_expected_return, 999.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_simulations() {
        let api = Arc::new(MockApi::default());
        let (store, trigger) = trigger(api.clone()).await;

        select_full(&store).await;
        trigger.shutdown().await;
        wait_ms(1_000).await;
        assert_eq!(api.simulate_count(), 0);

        store.write().await.set_pool_allocation("0xA", 60.0);
        wait_ms(1_000).await;
        assert_eq!(api.simulate_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_unsubscribes_listener() {
        let api = Arc::new(MockApi::default());
        let (store, trigger) = trigger(api.clone()).await;
        assert_eq!(store.read().await.listener_count(), 1);

        drop(trigger);
        assert_eq!(store.read().await.listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_while_store_is_locked_unsubscribes_later() {
        let api = Arc::new(MockApi::default());
        let (store, trigger) = trigger(api.clone()).await;

        let guard = store.read().await;
        drop(trigger);
        assert_eq!(guard.listener_count(), 1);
        drop(guard);

        wait_ms(10).await;
        assert_eq!(store.read().await.listener_count(), 0);

        select_full(&store).await;
        wait_ms(1_000).await;
        assert_eq!(api.simulate_count(), 0);
    }
}
