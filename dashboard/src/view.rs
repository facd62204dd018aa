use crate::actions::Action;
use crate::notifications::Notification;
use crate::state::{AppState, FormField};
use common::amount::ScaleFactor;
use common::short_address;
use prettytable::{row, Table};
use serde::Serialize;

pub const APP_TITLE: &str = "CollateralX Protocol";
pub const APP_SUBTITLE: &str = "DeFi Lending and Borrowing Platform";

const COLLATERAL_UNIT: &str = "ETH";
const TOKEN_UNIT: &str = "TC";
const PROCESSING_LABEL: &str = "Processing...";

/// A button bound to one orchestrator action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Control {
    pub label: &'static str,
    pub action: Action,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputView {
    pub label: &'static str,
    pub field: FormField,
    pub value: String,
    pub placeholder: &'static str,
    /// Hidden while loading
    pub unit: Option<&'static str>,
    pub helper: String,
    pub button: Option<Control>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Panel {
    pub title: &'static str,
    pub skeleton: bool,
    pub inputs: Vec<InputView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stat {
    pub label: &'static str,
    pub value: String,
    pub skeleton: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanView {
    /// 1-based, as typed into the repay form
    pub number: usize,
    pub principal: String,
    pub interest: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoansView {
    pub loans: Vec<LoanView>,
    pub skeleton: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectedView {
    pub account: String,
    pub network: &'static str,
    pub faucet: Control,
    pub stats: Vec<Stat>,
    pub panels: Vec<Panel>,
    /// Absent when there are no loans and nothing is loading
    pub loans: Option<LoansView>,
    pub is_loading: bool,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DashboardView {
    Disconnected {
        title: &'static str,
        subtitle: &'static str,
        connect_label: &'static str,
        notifications: Vec<Notification>,
    },
    Connected(ConnectedView),
}

/// Renders the dashboard from the current state. No side effects.
pub fn render(state: &AppState) -> DashboardView {
    let Some(connection) = state.connection else {
        return DashboardView::Disconnected {
            title: APP_TITLE,
            subtitle: APP_SUBTITLE,
            connect_label: "Connect Wallet",
            notifications: state.notifications.clone(),
        };
    };

    let loading = state.is_loading;
    let snapshot = &state.snapshot;
    let wad = ScaleFactor::WAD;

    let stat = |label, value| Stat { label, value, skeleton: loading };
    let stats = vec![
        stat(
            "Your Collateral",
            format!("{} {}", wad.format_fixed(snapshot.collateral_balance, 4), COLLATERAL_UNIT),
        ),
        stat(
            "Your Balance",
            format!("{} {}", wad.format_fixed(snapshot.user_token_balance, 2), TOKEN_UNIT),
        ),
        stat("Active Loans", snapshot.loans.len().to_string()),
        stat(
            "Contract Balance",
            format!("{} {}", wad.format_fixed(snapshot.contract_token_balance, 2), TOKEN_UNIT),
        ),
    ];

    let loans = (!snapshot.loans.is_empty() || loading).then(|| LoansView {
        loans: snapshot
            .loans
            .iter()
            .enumerate()
            .map(|(index, loan)| LoanView {
                number: index + 1,
                principal: format!("{} {}", wad.format(loan.principal), TOKEN_UNIT),
                interest: format!("{} {}", wad.format(loan.interest), TOKEN_UNIT),
            })
            .collect(),
        skeleton: loading,
    });

    DashboardView::Connected(ConnectedView {
        account: short_address(&connection.account),
        network: connection.network.name,
        faucet: Control { label: "Get Test Tokens", action: Action::Faucet, enabled: !loading },
        stats,
        panels: panels(state),
        loans,
        is_loading: loading,
        notifications: state.notifications.clone(),
    })
}

fn control(state: &AppState, label: &'static str, action: Action) -> Control {
    let enabled = !state.is_loading
        && action.required_fields().iter().all(|&field| !state.forms.is_empty(field));
    let label = if state.is_loading { PROCESSING_LABEL } else { label };
    Control { label, action, enabled }
}

fn input(
    state: &AppState,
    label: &'static str,
    field: FormField,
    placeholder: &'static str,
    unit: Option<&'static str>,
    helper: String,
) -> InputView {
    InputView {
        label,
        field,
        value: state.forms.get(field).to_string(),
        placeholder,
        unit: unit.filter(|_| !state.is_loading),
        helper,
        button: None,
    }
}

fn panels(state: &AppState) -> Vec<Panel> {
    let skeleton = state.is_loading;
    let loan_count = state.snapshot.loans.len();

    let with_button = |mut view: InputView, label, action| {
        view.button = Some(control(state, label, action));
        view
    };

    vec![
        Panel {
            title: "Collateral Management",
            skeleton,
            inputs: vec![
                with_button(
                    input(
                        state,
                        "Deposit Collateral",
                        FormField::CollateralAmount,
                        "Enter amount",
                        Some(COLLATERAL_UNIT),
                        "Deposit ETH as collateral to borrow stablecoins".into(),
                    ),
                    "Deposit",
                    Action::DepositCollateral,
                ),
                with_button(
                    input(
                        state,
                        "Withdraw Collateral",
                        FormField::WithdrawAmount,
                        "Enter amount",
                        Some(COLLATERAL_UNIT),
                        "Withdraw your deposited ETH".into(),
                    ),
                    "Withdraw",
                    Action::WithdrawCollateral,
                ),
            ],
        },
        Panel {
            title: "Borrow Stablecoin",
            skeleton,
            inputs: vec![with_button(
                input(
                    state,
                    "Borrow Stablecoin",
                    FormField::BorrowAmount,
                    "Enter amount",
                    Some(TOKEN_UNIT),
                    "Borrow stablecoins against your ETH collateral".into(),
                ),
                "Borrow",
                Action::Borrow,
            )],
        },
        Panel {
            title: "Repay Loan",
            skeleton,
            inputs: vec![
                input(
                    state,
                    "Loan Number",
                    FormField::RepayLoanNumber,
                    "Enter loan #",
                    None,
                    format!("Enter the loan number you want to repay (1-{})", loan_count),
                ),
                with_button(
                    input(
                        state,
                        "Authorize Payment",
                        FormField::RepayAmount,
                        "Enter amount",
                        Some(TOKEN_UNIT),
                        "Authorize enough stablecoins to repay the specified loan".into(),
                    ),
                    "Repay",
                    Action::Repay,
                ),
            ],
        },
        Panel {
            title: "Liquidate Position",
            skeleton,
            inputs: vec![with_button(
                input(
                    state,
                    "Liquidate Position",
                    FormField::LiquidateAddress,
                    "Enter wallet address",
                    None,
                    "Liquidate undercollateralized positions to collect ETH".into(),
                ),
                "Liquidate",
                Action::Liquidate,
            )],
        },
    ]
}

/// Plain-text rendering of a view for terminals and `GET /`
pub fn render_text(view: &DashboardView) -> String {
    match view {
        DashboardView::Disconnected { title, subtitle, connect_label, notifications } => {
            let mut out = format!("{}\n{}\n\n[{}]\n", title, subtitle, connect_label);
            push_notifications(&mut out, notifications);
            out
        }
        DashboardView::Connected(view) => {
            let mut out = format!(
                "{}\nConnected: {} ({})  [{}{}]\n",
                APP_TITLE,
                view.account,
                view.network,
                view.faucet.label,
                if view.faucet.enabled { "" } else { ", disabled" }
            );
            push_notifications(&mut out, &view.notifications);

            let mut stats = Table::new();
            for stat in &view.stats {
                stats.add_row(row![stat.label, stat.value]);
            }
            out.push_str(&stats.to_string());

            let mut actions = Table::new();
            actions.add_row(row!["Panel", "Input", "Value", "Action"]);
            for panel in &view.panels {
                for input in &panel.inputs {
                    let button = match &input.button {
                        Some(b) if b.enabled => b.label.to_string(),
                        Some(b) => format!("{} (disabled)", b.label),
                        None => String::new(),
                    };
                    actions.add_row(row![panel.title, input.label, input.value, button]);
                }
            }
            out.push_str(&actions.to_string());

            if let Some(loans) = &view.loans {
                let mut table = Table::new();
                table.add_row(row!["Loan #", "Principal", "Interest"]);
                for loan in &loans.loans {
                    table.add_row(row![loan.number, loan.principal, loan.interest]);
                }
                out.push_str("Your Loans\n");
                out.push_str(&table.to_string());
            }

            out
        }
    }
}

fn push_notifications(out: &mut String, notifications: &[Notification]) {
    for notification in notifications.iter().filter(|n| !n.removing) {
        out.push_str(&format!("[{}] {}\n", notification.kind, notification.message));
    }
}
