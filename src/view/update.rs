//! Pure transition functions for the dashboard.
//!
//! [`reduce`] applies one [`ViewAction`] to a [`ViewState`]. [`update`] is
//! the lifecycle controller: it applies a [`DashboardMsg`] to the model and
//! returns the [`DashboardCmd`] the runtime should execute.
//!
//! **Design invariant:** this module performs zero I/O.

use super::model::{
    DashboardCmd, DashboardModel, DashboardMsg, LifecycleEvent, LoadPhase, LoadTicket,
    ViewAction, ViewState,
};

/// Apply one action to the view state.
///
/// Total over every state; never emits further actions.
pub fn reduce(state: &mut ViewState, action: ViewAction) {
    match action {
        ViewAction::SetValues(values) => {
            state.values = values;
            state.active_file = None;
        }
        ViewAction::SetFilePrefix(prefix) => state.file_prefix = prefix,
        ViewAction::SetPath(path) => state.path = path,
        ViewAction::SetMetricType(metric) => state.metric_type = metric,
        ViewAction::SetActiveFile(record) => state.active_file = record,
        ViewAction::SetRegressionType(regression) => state.regression_type = regression,
        ViewAction::SetDisplayRegression(on) => state.display_regression = on,
        ViewAction::SetDisplayFilenames(on) => state.display_filenames = on,
        ViewAction::SetPlotType(plot) => state.plot_type = plot,
        ViewAction::ResetDataset => {
            state.values.clear();
            state.file_prefix.clear();
            state.path.clear();
            state.active_file = None;
        }
    }
}

/// Apply a message to the model and return the next command for the runtime.
///
/// Every lifecycle transition goes through this function.
pub fn update(model: &mut DashboardModel, msg: DashboardMsg) -> DashboardCmd {
    match msg {
        DashboardMsg::Start => {
            if model.phase == LoadPhase::Idle {
                begin_load(model)
            } else {
                DashboardCmd::None
            }
        }

        DashboardMsg::SelectDataset(dataset) => {
            // Static pages navigate to a per-type page instead.
            if model.serve_static {
                return DashboardCmd::None;
            }
            if dataset == model.dataset && model.phase != LoadPhase::Idle {
                return DashboardCmd::None;
            }
            model.dataset = dataset.clone();
            reduce(&mut model.view, ViewAction::ResetDataset);
            DashboardCmd::Batch(vec![
                DashboardCmd::Emit(LifecycleEvent::DatasetSelected { dataset }),
                begin_load(model),
            ])
        }

        DashboardMsg::LoadFinished { ticket, result } => {
            if model.current_ticket() != Some(&ticket) {
                model.loads_discarded += 1;
                return DashboardCmd::Emit(LifecycleEvent::StaleLoadDiscarded { ticket });
            }

            model.loads_completed += 1;
            let event = match result {
                Ok(loaded) => {
                    let records = loaded.values.len();
                    reduce(&mut model.view, ViewAction::SetValues(loaded.values));
                    if let Some(prefix) = &loaded.file_prefix {
                        reduce(&mut model.view, ViewAction::SetFilePrefix(prefix.clone()));
                    }
                    model.phase = LoadPhase::Ready;
                    LifecycleEvent::LoadSucceeded {
                        ticket,
                        records,
                        file_prefix: loaded.file_prefix,
                    }
                }
                Err(error) => {
                    model.phase = LoadPhase::Failed(error.clone());
                    LifecycleEvent::LoadFailed { ticket, error }
                }
            };
            DashboardCmd::Batch(vec![
                DashboardCmd::Emit(event),
                DashboardCmd::NotifyFinishedLoading,
            ])
        }

        DashboardMsg::View(action) => {
            // A click queued before a dataset switch must not select a
            // record the current dataset does not hold.
            if let ViewAction::SetActiveFile(Some(record)) = &action {
                if !model.view.values.contains(record) {
                    return DashboardCmd::None;
                }
            }
            let selection_change = match &action {
                ViewAction::SetActiveFile(record) => {
                    Some(record.as_ref().map(|r| r.filename.clone()))
                }
                _ => None,
            };
            reduce(&mut model.view, action);
            selection_change.map_or(DashboardCmd::None, |filename| {
                DashboardCmd::Emit(LifecycleEvent::ActiveFileChanged { filename })
            })
        }

        DashboardMsg::SelectFile(record) => {
            update(model, DashboardMsg::View(ViewAction::SetActiveFile(Some(record))))
        }

        DashboardMsg::CloseDetails => {
            update(model, DashboardMsg::View(ViewAction::SetActiveFile(None)))
        }
    }
}

/// Enter `Loading` with a fresh ticket, superseding any in-flight cycle.
fn begin_load(model: &mut DashboardModel) -> DashboardCmd {
    let ticket: LoadTicket = model.next_ticket();
    model.phase = LoadPhase::Loading(ticket.clone());
    DashboardCmd::Batch(vec![
        DashboardCmd::Emit(LifecycleEvent::LoadStarted {
            ticket: ticket.clone(),
        }),
        DashboardCmd::Load(ticket),
    ])
}
