//! Property-based tests for reducer, derivation and lifecycle invariants.

use proptest::prelude::*;

use super::derive::{derive, effective_prefix};
use super::loader::LoadedDataset;
use super::model::{
    DashboardModel, DashboardMsg, DatasetType, LoadPhase, LoadTicket, MetricRecord, MetricType,
    PlotType, RegressionType, ViewAction, ViewState,
};
use super::update::{reduce, update};
use crate::core::errors::{LoadError, LoadSource};

// ──────────────────── strategies ────────────────────

fn arb_dir() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("app/"), Just("app/models/"), Just("lib/"), Just("spec/"), Just("")]
}

fn arb_record() -> impl Strategy<Value = MetricRecord> {
    (arb_dir(), "[a-z]{1,6}", 0.0f64..100.0, 0.0f64..100.0).prop_map(
        |(dir, name, churn, complexity)| {
            MetricRecord::new(format!("{dir}{name}.rb"), churn, complexity)
        },
    )
}

fn arb_values() -> impl Strategy<Value = Vec<MetricRecord>> {
    prop::collection::vec(arb_record(), 0..20)
}

fn arb_metric() -> impl Strategy<Value = MetricType> {
    prop_oneof![
        Just(MetricType::ChurnComplexity),
        Just(MetricType::Complexity),
        Just(MetricType::Churn),
    ]
}

fn arb_filter() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("app".to_owned()),
        Just("app/".to_owned()),
        Just("models/".to_owned()),
        Just("lib/".to_owned()),
        "[a-z/]{0,4}",
    ]
}

fn arb_action() -> impl Strategy<Value = ViewAction> {
    prop_oneof![
        arb_values().prop_map(ViewAction::SetValues),
        arb_filter().prop_map(ViewAction::SetFilePrefix),
        arb_filter().prop_map(ViewAction::SetPath),
        arb_metric().prop_map(ViewAction::SetMetricType),
        proptest::option::of(arb_record()).prop_map(ViewAction::SetActiveFile),
        prop_oneof![Just(RegressionType::PowerLaw), Just(RegressionType::Linear)]
            .prop_map(ViewAction::SetRegressionType),
        any::<bool>().prop_map(ViewAction::SetDisplayRegression),
        any::<bool>().prop_map(ViewAction::SetDisplayFilenames),
        prop_oneof![Just(PlotType::ScatterPlot), Just(PlotType::TreeMap)]
            .prop_map(ViewAction::SetPlotType),
        Just(ViewAction::ResetDataset),
    ]
}

fn arb_dataset() -> impl Strategy<Value = DatasetType> {
    prop_oneof![Just("rb"), Just("js"), Just("py")].prop_map(DatasetType::new)
}

/// Lifecycle messages, including results carrying arbitrary (often stale) tickets.
fn arb_lifecycle_msg() -> impl Strategy<Value = DashboardMsg> {
    prop_oneof![
        Just(DashboardMsg::Start),
        arb_dataset().prop_map(DashboardMsg::SelectDataset),
        (0u64..8, arb_dataset(), arb_values(), any::<bool>()).prop_map(
            |(generation, dataset, values, ok)| DashboardMsg::LoadFinished {
                ticket: LoadTicket {
                    generation,
                    dataset,
                },
                result: if ok {
                    Ok(LoadedDataset {
                        values,
                        file_prefix: None,
                    })
                } else {
                    Err(LoadError::new(LoadSource::Values, "boom"))
                },
            }
        ),
        arb_filter().prop_map(|p| DashboardMsg::View(ViewAction::SetPath(p))),
        arb_record().prop_map(DashboardMsg::SelectFile),
        Just(DashboardMsg::CloseDetails),
    ]
}

// ──────────────────── properties ────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Replaying an action sequence from the same state yields the same state.
    #[test]
    fn reducer_is_deterministic(actions in prop::collection::vec(arb_action(), 0..30)) {
        let mut a = ViewState::default();
        let mut b = ViewState::default();
        for action in actions {
            reduce(&mut a, action.clone());
            reduce(&mut b, action);
        }
        prop_assert_eq!(a, b);
    }

    /// Derived points are exactly the prefix-matching records, in dataset order.
    #[test]
    fn derived_points_are_ordered_prefix_subsequence(
        values in arb_values(),
        prefix in arb_filter(),
        path in arb_filter(),
        metric in arb_metric(),
    ) {
        let mut state = ViewState::default();
        reduce(&mut state, ViewAction::SetValues(values.clone()));
        reduce(&mut state, ViewAction::SetFilePrefix(prefix.clone()));
        reduce(&mut state, ViewAction::SetPath(path.clone()));
        reduce(&mut state, ViewAction::SetMetricType(metric));

        let wanted = format!("{prefix}{path}");
        prop_assert_eq!(effective_prefix(&state), wanted.clone());

        let view = derive(&state);
        let expected: Vec<&MetricRecord> =
            values.iter().filter(|r| r.filename.starts_with(&wanted)).collect();
        let got: Vec<&MetricRecord> = view.points.iter().map(|p| p.record).collect();
        prop_assert_eq!(got, expected);

        for point in &view.points {
            prop_assert_eq!(point.value.to_bits(), metric.value_of(point.record).to_bits());
        }
    }

    /// Deriving never mutates the state it reads.
    #[test]
    fn derive_leaves_state_untouched(actions in prop::collection::vec(arb_action(), 0..20)) {
        let mut state = ViewState::default();
        for action in actions {
            reduce(&mut state, action);
        }
        let before = state.clone();
        let _ = derive(&state);
        prop_assert_eq!(state, before);
    }

    /// Switching type drops the previous dataset but keeps display settings.
    #[test]
    fn type_switch_isolates_datasets(
        actions in prop::collection::vec(arb_action(), 0..20),
        target in arb_dataset(),
    ) {
        let mut model = DashboardModel::new("rb".into(), ViewState::default(), false);
        let _ = update(&mut model, DashboardMsg::Start);
        for action in actions {
            let _ = update(&mut model, DashboardMsg::View(action));
        }
        let before = model.view.clone();
        let switched = target != model.dataset;

        let _ = update(&mut model, DashboardMsg::SelectDataset(target.clone()));

        if switched {
            prop_assert!(model.view.values.is_empty());
            prop_assert!(model.view.file_prefix.is_empty());
            prop_assert!(model.view.path.is_empty());
            prop_assert!(model.view.active_file.is_none());
            prop_assert_eq!(model.current_ticket().map(|t| &t.dataset), Some(&target));
        } else {
            prop_assert_eq!(&model.view.values, &before.values);
        }
        prop_assert_eq!(model.view.metric_type, before.metric_type);
        prop_assert_eq!(model.view.regression_type, before.regression_type);
        prop_assert_eq!(model.view.plot_type, before.plot_type);
        prop_assert_eq!(model.view.display_regression, before.display_regression);
        prop_assert_eq!(model.view.display_filenames, before.display_filenames);
    }

    /// Only the result of the current cycle ever reaches the view, and the
    /// selection always names a record of the loaded dataset.
    #[test]
    fn only_current_ticket_commits(msgs in prop::collection::vec(arb_lifecycle_msg(), 1..40)) {
        let mut model = DashboardModel::new("rb".into(), ViewState::default(), false);
        for msg in msgs {
            let current = model.current_ticket().cloned();
            let values_before = model.view.values.clone();
            let phase_before = model.phase.clone();

            let finished = match &msg {
                DashboardMsg::LoadFinished { ticket, .. } => Some(ticket.clone()),
                _ => None,
            };
            let _ = update(&mut model, msg);

            if let Some(ticket) = finished {
                if current.as_ref() == Some(&ticket) {
                    prop_assert!(matches!(model.phase, LoadPhase::Ready | LoadPhase::Failed(_)));
                } else {
                    prop_assert_eq!(&model.view.values, &values_before);
                    prop_assert_eq!(&model.phase, &phase_before);
                }
            }

            if let Some(active) = &model.view.active_file {
                prop_assert!(model.view.values.contains(active));
            }

            if let LoadPhase::Loading(ticket) = &model.phase {
                prop_assert_eq!(ticket.generation, model.generation);
                prop_assert_eq!(&ticket.dataset, &model.dataset);
            }
        }
    }

    /// Generations handed out by the controller strictly increase.
    #[test]
    fn generations_increase(msgs in prop::collection::vec(arb_lifecycle_msg(), 1..40)) {
        let mut model = DashboardModel::new("rb".into(), ViewState::default(), false);
        let mut last = 0;
        for msg in msgs {
            let _ = update(&mut model, msg);
            prop_assert!(model.generation >= last);
            last = model.generation;
        }
    }
}
