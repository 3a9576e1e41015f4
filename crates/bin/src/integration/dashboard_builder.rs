//! Turns a fetched [`Dataset`] into a [`Dashboard`].
//!
//! Sections are built independently from the same dataset. A section whose
//! inputs are missing still renders, with `N/A` tiles or a notice naming
//! the absent statement line.

use super::data_pipeline::Dataset;
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};
use valora_data::{FinancialStatement, LineItem, PriceHistory, StatementKind, YearSeries};
use valora_metrics::dividends::{
    Cagr, YieldPoint, YieldStats, annual_dividends, dividend_cagr, fcf_payout, yield_history,
};
use valora_metrics::multiples::{ev_ebitda_current, ev_ebitda_history, net_debt, net_debt_to_fcf, per_history};
use valora_metrics::returns::{annualized_return, drawdown, max_drawdown, total_return};
use valora_metrics::statements::{
    free_cash_flow_breakdown, linear_trend, margins, net_income, shares_outstanding,
};
use valora_metrics::valuation::{GrowthValuation, ValuationInputs};
use valora_metrics::weiss::{self, WeissAnalysis, WeissInputs};
use valora_output::{
    Chart, Dashboard, DashboardBuilder, MetricTile, Section, Series, Table, ValueFormat,
};

/// Metrics shared by several sections.
#[derive(Debug)]
struct Derived {
    annual: YearSeries,
    cagr: Option<Cagr>,
    yields: Vec<YieldPoint>,
    yield_stats: Option<YieldStats>,
    weiss: Option<WeissAnalysis>,
    valuation: GrowthValuation,
}

impl Derived {
    fn compute(data: &Dataset) -> Self {
        let annual = annual_dividends(&data.dividends, data.years());
        let cagr = dividend_cagr(&annual);
        let yields = yield_history(&data.prices, &annual);
        let yield_stats = YieldStats::from_history(&yields);
        let weiss = data.years().and_then(|years| {
            weiss::analyze(&WeissInputs {
                daily: &data.daily,
                dividends: &data.dividends,
                years,
                today: data.today,
                current_price: data.snapshot.current_price,
            })
        });
        let inputs = ValuationInputs::from_sources(
            &data.snapshot,
            &data.balance,
            cagr.map(|c| c.rate),
            data.request.desired_yield_fraction(),
        );
        Self {
            annual,
            cagr,
            yields,
            yield_stats,
            weiss,
            valuation: GrowthValuation::compute(&inputs),
        }
    }
}

/// Build every dashboard section for `data`.
pub(crate) fn build_dashboard(data: &Dataset) -> Dashboard {
    let derived = Derived::compute(data);
    let snapshot = &data.snapshot;

    let mut builder = DashboardBuilder::new()
        .symbol(data.symbol())
        .title(snapshot.display_name());
    let profile: Vec<&str> = [snapshot.sector.as_deref(), snapshot.industry.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !profile.is_empty() {
        builder = builder.subtitle(profile.join(" | "));
    }

    builder
        .section(key_data_section(data, &derived))
        .section(price_section(data))
        .section(drawdown_section(&data.prices))
        .section(dividend_section(data, &derived))
        .section(multiples_section(data))
        .section(balance_section(&data.balance))
        .section(income_section(data))
        .section(cash_flow_section(&data.cash_flow))
        .section(projection_section(data, &derived))
        .section(relevant_data_section(data, &derived))
        .build()
}

fn not_found(item: LineItem) -> String {
    format!("'{}' not found in the {}", item.label(), item.statement().label())
}

fn date_labels(points: impl IntoIterator<Item = NaiveDate>) -> Vec<String> {
    points
        .into_iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect()
}

fn union_years<'a>(series: impl IntoIterator<Item = &'a YearSeries>) -> Vec<i32> {
    series
        .into_iter()
        .flat_map(|s| s.keys().copied())
        .collect::<BTreeSet<i32>>()
        .into_iter()
        .collect()
}

fn on_years(years: &[i32], series: &YearSeries) -> Vec<Option<f64>> {
    years.iter().map(|y| series.get(y).copied()).collect()
}

fn year_labels(years: &[i32]) -> Vec<String> {
    years.iter().map(ToString::to_string).collect()
}

/// Bar chart of yearly series sharing one format.
fn year_bars(title: &str, lines: &[(&str, &YearSeries)], format: ValueFormat) -> Chart {
    let years = union_years(lines.iter().map(|(_, s)| *s));
    lines.iter().fold(Chart::new(title, year_labels(&years)), |chart, (name, series)| {
        chart.with_series(Series::bar(*name, format, on_years(&years, series)))
    })
}

/// Year-by-year table of series sharing one format.
fn year_table(title: &str, lines: &[(&str, &YearSeries)], format: ValueFormat) -> Table {
    let years = union_years(lines.iter().map(|(_, s)| *s));
    let columns = std::iter::once("Year").chain(lines.iter().map(|(name, _)| *name));
    let mut table = Table::new(title, columns);
    for year in years {
        let cells = std::iter::once(year.to_string())
            .chain(lines.iter().map(|(_, s)| format.apply(s.get(&year).copied())));
        table.push_row(cells);
    }
    table
}

const fn line_format(item: LineItem) -> ValueFormat {
    match item {
        LineItem::BasicEps | LineItem::DilutedEps => ValueFormat::Money,
        LineItem::OrdinarySharesNumber => ValueFormat::Count,
        _ => ValueFormat::MoneyLarge,
    }
}

/// Every reported line of a statement, one column per fiscal year.
fn statement_table(title: &str, statement: &FinancialStatement) -> Table {
    let years: Vec<i32> = statement.years().into_iter().collect();
    let columns = std::iter::once("Line".to_string()).chain(year_labels(&years));
    let mut table = Table::new(title, columns);
    for item in statement.kind.line_items() {
        let Some(series) = statement.get(item) else {
            continue;
        };
        let format = line_format(item);
        let cells = std::iter::once(item.label().to_string())
            .chain(years.iter().map(|y| format.apply(series.get(y).copied())));
        table.push_row(cells);
    }
    table
}

fn key_data_section(data: &Dataset, derived: &Derived) -> Section {
    let snapshot = &data.snapshot;
    let mut section = Section::new("Key data");
    section.metrics(vec![
        MetricTile::formatted("Current price", snapshot.current_price, ValueFormat::Money),
        MetricTile::formatted("Current dividend", snapshot.dividend_rate, ValueFormat::Money),
        MetricTile::formatted(
            "Current yield",
            derived.valuation.current_yield,
            ValueFormat::Percent,
        ),
        MetricTile::formatted("PER", snapshot.trailing_pe, ValueFormat::Multiple),
        MetricTile::formatted("Payout", snapshot.payout_ratio, ValueFormat::Percent),
        MetricTile::formatted("EPS", snapshot.trailing_eps, ValueFormat::Money),
        MetricTile::formatted(
            "Dividend CAGR",
            derived.cagr.map(|c| c.rate),
            ValueFormat::Percent,
        ),
    ]);
    section
}

fn price_section(data: &Dataset) -> Section {
    let prices = &data.prices;
    let title = format!(
        "Price ({}, {})",
        data.request.lookback().code(),
        prices.frequency.label()
    );
    let chart = Chart::new(title, date_labels(prices.points.iter().map(|p| p.date))).with_series(
        Series::line(
            "Close",
            ValueFormat::Money,
            prices.points.iter().map(|p| Some(p.close)).collect(),
        ),
    );

    let mut section = Section::new("Price history");
    section.chart(chart).metrics(vec![
        MetricTile::formatted("Total return", total_return(prices), ValueFormat::Percent),
        MetricTile::formatted(
            "Annualized return",
            annualized_return(prices),
            ValueFormat::Percent,
        ),
    ]);
    section
}

fn drawdown_section(prices: &PriceHistory) -> Section {
    let points = drawdown(prices);
    let chart = Chart::new("Drawdown", date_labels(points.iter().map(|p| p.date))).with_series(
        Series::line(
            "Drawdown",
            ValueFormat::PercentPoints,
            points.iter().map(|p| Some(p.drawdown * 100.0)).collect(),
        ),
    );

    let mut section = Section::new("Drawdown");
    section.chart(chart).metrics(vec![MetricTile::formatted(
        "Maximum drawdown",
        max_drawdown(&points),
        ValueFormat::Percent,
    )]);
    section
}

fn dividend_section(data: &Dataset, derived: &Derived) -> Section {
    let mut section = Section::new("Dividend valuation");
    annual_dividend_block(&mut section, data.symbol(), derived);
    sustainability_block(&mut section, &data.cash_flow);
    yield_block(&mut section, derived);
    weiss_block(&mut section, &data.daily, derived.weiss.as_ref());
    section
}

fn annual_dividend_block(section: &mut Section, symbol: &str, derived: &Derived) {
    section.heading("Annual dividends");
    if derived.annual.is_empty() {
        section.warning(format!("No dividend history for {}", symbol));
        return;
    }
    let lines = [("Dividend", &derived.annual)];
    section.chart(year_bars("Annual dividends", &lines, ValueFormat::Money));
    match derived.cagr {
        Some(cagr) => section.info(format!(
            "Dividend CAGR: {:.2}% per year ({}-{})",
            cagr.rate * 100.0,
            cagr.start_year,
            cagr.end_year
        )),
        None => section.info("Dividend CAGR: not available (insufficient data)"),
    };
    section.table(year_table("Annual dividends", &lines, ValueFormat::Money));
}

fn sustainability_block(section: &mut Section, cash_flow: &FinancialStatement) {
    section.heading("Dividend sustainability");
    let (Some(fcf), Some(paid)) = (
        cash_flow.get(LineItem::FreeCashFlow),
        cash_flow.get(LineItem::CashDividendsPaid),
    ) else {
        section.warning(format!(
            "'{}' or '{}' not found in the {}",
            LineItem::FreeCashFlow.label(),
            LineItem::CashDividendsPaid.label(),
            StatementKind::CashFlow.label()
        ));
        return;
    };
    let paid: YearSeries = paid.iter().map(|(y, v)| (*y, v.abs())).collect();
    let payout = fcf_payout(fcf, &paid);
    let years = union_years([fcf, &paid]);
    let chart = Chart::new("Dividend sustainability", year_labels(&years))
        .with_series(Series::bar("Free cash flow", ValueFormat::MoneyLarge, on_years(&years, fcf)))
        .with_series(Series::bar("Dividends paid", ValueFormat::MoneyLarge, on_years(&years, &paid)))
        .with_series(
            Series::line("FCF payout", ValueFormat::Percent, on_years(&years, &payout)).secondary(),
        );
    section.chart(chart);
}

fn yield_block(section: &mut Section, derived: &Derived) {
    section.heading("Historical dividend yield");
    let Some(stats) = derived.yield_stats else {
        section.warning("Not enough dividend and price data to compute the yield history");
        return;
    };
    let chart = Chart::new(
        "Dividend yield history",
        date_labels(derived.yields.iter().map(|p| p.date)),
    )
    .with_series(Series::line(
        "Yield",
        ValueFormat::Percent,
        derived.yields.iter().map(|p| Some(p.dividend_yield)).collect(),
    ))
    .with_reference_line("Average", Some(stats.average))
    .with_reference_line("Maximum", Some(stats.max))
    .with_reference_line("Minimum", Some(stats.min));
    section.chart(chart).metrics(vec![
        MetricTile::formatted("Average yield", Some(stats.average), ValueFormat::Percent),
        MetricTile::formatted("Maximum yield", Some(stats.max), ValueFormat::Percent),
        MetricTile::formatted("Minimum yield", Some(stats.min), ValueFormat::Percent),
    ]);
}

fn weiss_block(
    section: &mut Section,
    daily: &PriceHistory,
    analysis: Option<&WeissAnalysis>,
) {
    section.heading("Geraldine Weiss");
    let Some(w) = analysis else {
        section.warning("Geraldine Weiss analysis needs a dividend history and daily prices");
        return;
    };

    section.metrics(vec![
        MetricTile::formatted("Current price", Some(w.current_price), ValueFormat::Money),
        MetricTile::formatted("Annual dividend", w.last_dividend, ValueFormat::Money),
        MetricTile::formatted("Dividend CAGR", w.cagr.map(|c| c.rate), ValueFormat::Percent),
        MetricTile::formatted("Maximum yield", Some(w.max_yield), ValueFormat::Percent),
        MetricTile::formatted("Minimum yield", Some(w.min_yield), ValueFormat::Percent),
        MetricTile::formatted("Overvalued price", w.overvalued_price, ValueFormat::Money),
        MetricTile::formatted("Undervalued price", w.undervalued_price, ValueFormat::Money),
    ]);

    section.chart(weiss_chart(daily, w));

    let mut table = Table::new(
        "Geraldine Weiss data",
        [
            "Year",
            "Month",
            "Price",
            "Annual Dividend",
            "Yield",
            "Overvalued Price",
            "Undervalued Price",
        ],
    );
    for row in &w.rows {
        table.push_row([
            row.year.to_string(),
            row.month.clone(),
            ValueFormat::Money.apply(Some(row.price)),
            ValueFormat::Money.apply(row.annual_dividend),
            ValueFormat::Percent.apply(row.dividend_yield),
            ValueFormat::Money.apply(row.overvalued),
            ValueFormat::Money.apply(row.undervalued),
        ]);
    }
    section.table(table);
}

/// Daily closes against the bands of their year.
fn weiss_chart(daily: &PriceHistory, w: &WeissAnalysis) -> Chart {
    let bands: BTreeMap<i32, (f64, f64)> = w
        .bands
        .iter()
        .map(|b| (b.year, (b.overvalued, b.undervalued)))
        .collect();
    let band = |date: NaiveDate| bands.get(&date.year()).copied();

    Chart::new(
        "Geraldine Weiss bands",
        date_labels(daily.points.iter().map(|p| p.date)),
    )
    .with_series(Series::line(
        "Price",
        ValueFormat::Money,
        daily.points.iter().map(|p| Some(p.close)).collect(),
    ))
    .with_series(Series::line(
        "Overvalued",
        ValueFormat::Money,
        daily.points.iter().map(|p| band(p.date).map(|b| b.0)).collect(),
    ))
    .with_series(Series::line(
        "Undervalued",
        ValueFormat::Money,
        daily.points.iter().map(|p| band(p.date).map(|b| b.1)).collect(),
    ))
    .with_reference_line("Current price", Some(w.current_price))
}

fn multiples_section(data: &Dataset) -> Section {
    let mut section = Section::new("Multiples");
    let net_debt = net_debt(&data.balance);
    debt_block(&mut section, &data.cash_flow, &net_debt);
    per_block(&mut section, data);
    ev_block(&mut section, data, &net_debt);
    section
}

fn debt_block(section: &mut Section, cash_flow: &FinancialStatement, net_debt: &YearSeries) {
    section.heading("Debt evolution");
    let fcf = cash_flow.get(LineItem::FreeCashFlow);
    if fcf.is_none() {
        section.warning(not_found(LineItem::FreeCashFlow));
    }
    if net_debt.is_empty() {
        section.warning("Net debt not available: debt or cash missing from the balance sheet");
    }

    let net_debt = Some(net_debt).filter(|s| !s.is_empty());
    let years = union_years(fcf.into_iter().chain(net_debt));
    if years.is_empty() {
        return;
    }
    let mut chart = Chart::new("Debt evolution", year_labels(&years));
    if let Some(fcf) = fcf {
        chart = chart.with_series(Series::bar(
            "Free cash flow",
            ValueFormat::MoneyLarge,
            on_years(&years, fcf),
        ));
    }
    if let Some(net_debt) = net_debt {
        chart = chart.with_series(Series::bar(
            "Net debt",
            ValueFormat::MoneyLarge,
            on_years(&years, net_debt),
        ));
    }
    if let (Some(fcf), Some(net_debt)) = (fcf, net_debt) {
        let leverage = net_debt_to_fcf(net_debt, fcf);
        chart = chart.with_series(
            Series::line("Net debt / FCF", ValueFormat::Ratio, on_years(&years, &leverage))
                .secondary(),
        );
    }
    section.chart(chart);
}

fn per_block(section: &mut Section, data: &Dataset) {
    section.heading("PER");
    match data.snapshot.trailing_pe {
        Some(pe) => section.info(format!("Current PER is {:.2}x", pe)),
        None => section.info("Current PER not available"),
    };
    let Some(eps) = data.income.get(LineItem::BasicEps) else {
        section.warning(not_found(LineItem::BasicEps));
        return;
    };
    let rows = per_history(eps, &data.prices);
    let years: Vec<i32> = rows.iter().map(|r| r.year).collect();
    let chart = Chart::new("PER history", year_labels(&years))
        .with_series(Series::bar("EPS", ValueFormat::Money, rows.iter().map(|r| Some(r.eps)).collect()))
        .with_series(Series::line(
            "Price",
            ValueFormat::Money,
            rows.iter().map(|r| Some(r.price)).collect(),
        ))
        .with_series(
            Series::line("PER", ValueFormat::Multiple, rows.iter().map(|r| r.per).collect())
                .secondary(),
        );
    section.chart(chart);

    let mut table = Table::new("PER history", ["Year", "EPS", "Price", "PER"]);
    for row in &rows {
        table.push_row([
            row.year.to_string(),
            ValueFormat::Money.apply(Some(row.eps)),
            ValueFormat::Money.apply(Some(row.price)),
            ValueFormat::Multiple.apply(row.per),
        ]);
    }
    section.table(table);
}

fn ev_block(section: &mut Section, data: &Dataset, net_debt: &YearSeries) {
    section.heading("EV / EBITDA");
    let market_cap = data.snapshot.market_cap;
    match ev_ebitda_current(market_cap, &data.balance, &data.income) {
        Some(current) => section.info(format!("Current EV/EBITDA is {:.2}x", current)),
        None => section.info("Current EV/EBITDA not available"),
    };
    let Some(ebitda) = data.income.get(LineItem::Ebitda) else {
        section.warning(not_found(LineItem::Ebitda));
        return;
    };
    let rows = ev_ebitda_history(market_cap, net_debt, ebitda);
    let years: Vec<i32> = rows.iter().map(|r| r.year).collect();
    let chart = Chart::new("EV and EBITDA", year_labels(&years))
        .with_series(Series::bar(
            "EBITDA",
            ValueFormat::MoneyLarge,
            rows.iter().map(|r| r.ebitda).collect(),
        ))
        .with_series(Series::bar(
            "EV",
            ValueFormat::MoneyLarge,
            rows.iter().map(|r| r.enterprise_value).collect(),
        ))
        .with_series(
            Series::line(
                "EV/EBITDA",
                ValueFormat::Multiple,
                rows.iter().map(|r| r.ev_to_ebitda).collect(),
            )
            .secondary(),
        );
    section.chart(chart);
}

/// Total versus current: the total line is required, the current one optional.
fn total_and_current(
    section: &mut Section,
    balance: &FinancialStatement,
    heading: &str,
    total: LineItem,
    current: LineItem,
) {
    section.heading(heading);
    let Some(total_series) = balance.get(total) else {
        section.warning(not_found(total));
        return;
    };
    let mut lines = vec![(total.label(), total_series)];
    match balance.get(current) {
        Some(current_series) => lines.push((current.label(), current_series)),
        None => {
            section.warning(not_found(current));
        }
    }
    section
        .chart(year_bars(heading, &lines, ValueFormat::MoneyLarge))
        .table(year_table(heading, &lines, ValueFormat::MoneyLarge));
}

fn balance_section(balance: &FinancialStatement) -> Section {
    let mut section = Section::new("Balance sheet");
    total_and_current(
        &mut section,
        balance,
        "Assets",
        LineItem::TotalAssets,
        LineItem::CurrentAssets,
    );
    total_and_current(
        &mut section,
        balance,
        "Liabilities",
        LineItem::TotalLiabilities,
        LineItem::CurrentLiabilities,
    );

    section.heading("Total debt vs net debt");
    match (balance.get(LineItem::TotalDebt), balance.get(LineItem::NetDebt)) {
        (Some(total), Some(net)) => {
            let lines = [
                (LineItem::TotalDebt.label(), total),
                (LineItem::NetDebt.label(), net),
            ];
            section
                .chart(year_bars("Total debt vs net debt", &lines, ValueFormat::MoneyLarge))
                .table(year_table("Total debt vs net debt", &lines, ValueFormat::MoneyLarge));
        }
        _ => {
            section.warning(format!(
                "Both '{}' and '{}' are needed in the {}",
                LineItem::TotalDebt.label(),
                LineItem::NetDebt.label(),
                StatementKind::BalanceSheet.label()
            ));
        }
    }

    section.heading("Equity");
    match balance.get(LineItem::TotalEquity) {
        Some(equity) => {
            let lines = [(LineItem::TotalEquity.label(), equity)];
            section
                .chart(year_bars("Equity", &lines, ValueFormat::MoneyLarge))
                .table(year_table("Equity", &lines, ValueFormat::MoneyLarge));
        }
        None => {
            section.warning(not_found(LineItem::TotalEquity));
        }
    }

    section.heading("Balance evolution");
    let required = [
        LineItem::TotalAssets,
        LineItem::TotalLiabilities,
        LineItem::TotalEquity,
    ];
    let missing: Vec<String> = required
        .iter()
        .filter(|item| !balance.has(**item))
        .map(|item| format!("'{}'", item.label()))
        .collect();
    if missing.is_empty() {
        let lines: Vec<(&str, &YearSeries)> = required
            .iter()
            .filter_map(|item| Some((item.label(), balance.get(*item)?)))
            .collect();
        let years = union_years(lines.iter().map(|(_, s)| *s));
        let chart = lines
            .iter()
            .fold(Chart::new("Balance evolution", year_labels(&years)), |chart, (name, s)| {
                chart.with_series(Series::line(*name, ValueFormat::MoneyLarge, on_years(&years, s)))
            });
        section.chart(chart);
    } else {
        section.warning(format!(
            "Missing for the balance evolution: {}",
            missing.join(", ")
        ));
    }

    section.heading("Balance sheet detail");
    section.table(statement_table("Balance sheet", balance));
    section
}

fn income_section(data: &Dataset) -> Section {
    let income = &data.income;
    let mut section = Section::new("Income statement");

    section.heading("Revenue and profits");
    let required = [
        LineItem::TotalRevenue,
        LineItem::GrossProfit,
        LineItem::OperatingIncome,
    ];
    let missing: Vec<LineItem> = required.into_iter().filter(|i| !income.has(*i)).collect();
    if missing.is_empty() {
        let mut lines: Vec<(&str, &YearSeries)> = required
            .iter()
            .filter_map(|item| Some((item.label(), income.get(*item)?)))
            .collect();
        if let Some(net) = net_income(income) {
            lines.push((LineItem::NetIncome.label(), net));
        }
        section
            .chart(year_bars("Revenue and profits", &lines, ValueFormat::MoneyLarge))
            .table(year_table("Revenue and profits", &lines, ValueFormat::MoneyLarge));
    } else {
        for item in missing {
            section.warning(not_found(item));
        }
    }

    section.heading("Margins");
    let rows = margins(income);
    let years: Vec<i32> = rows.iter().map(|r| r.year).collect();
    let chart = Chart::new("Margins", year_labels(&years))
        .with_series(Series::line(
            "Gross margin",
            ValueFormat::Percent,
            rows.iter().map(|r| r.gross).collect(),
        ))
        .with_series(Series::line(
            "Operating margin",
            ValueFormat::Percent,
            rows.iter().map(|r| r.operating).collect(),
        ))
        .with_series(Series::line(
            "Net margin",
            ValueFormat::Percent,
            rows.iter().map(|r| r.net).collect(),
        ));
    section.chart(chart);

    section.heading("EPS");
    match data.snapshot.trailing_eps {
        Some(eps) => section.info(format!("Current EPS is ${:.2}", eps)),
        None => section.warning("Current EPS not available"),
    };
    match income.get(LineItem::DilutedEps) {
        Some(eps) => {
            section.chart(year_bars(
                "Diluted EPS",
                &[(LineItem::DilutedEps.label(), eps)],
                ValueFormat::Money,
            ));
        }
        None => {
            section.warning(not_found(LineItem::DilutedEps));
        }
    }

    section.heading("Shares outstanding");
    let shares = shares_outstanding(&data.balance);
    if shares.is_empty() {
        section.warning(not_found(LineItem::OrdinarySharesNumber));
    } else {
        section.chart(year_bars(
            "Shares outstanding",
            &[(LineItem::OrdinarySharesNumber.label(), &shares)],
            ValueFormat::Count,
        ));
    }

    section.heading("Income statement detail");
    section.table(statement_table("Income statement", income));
    section
}

fn cash_flow_section(cash_flow: &FinancialStatement) -> Section {
    let mut section = Section::new("Cash flow");

    section.heading("Free cash flow");
    let missing: Vec<LineItem> = [LineItem::OperatingCashFlow, LineItem::CapitalExpenditure]
        .into_iter()
        .filter(|i| !cash_flow.has(*i))
        .collect();
    if missing.is_empty() {
        let rows = free_cash_flow_breakdown(cash_flow);
        let years: Vec<i32> = rows.iter().map(|r| r.year).collect();
        let chart = Chart::new("Free cash flow", year_labels(&years))
            .with_series(Series::bar(
                "Operating cash flow",
                ValueFormat::MoneyLarge,
                rows.iter().map(|r| Some(r.operating_cash_flow)).collect(),
            ))
            .with_series(Series::bar(
                "Capital expenditure",
                ValueFormat::MoneyLarge,
                rows.iter().map(|r| Some(r.capital_expenditure)).collect(),
            ))
            .with_series(
                Series::line(
                    "FCF / OCF",
                    ValueFormat::Percent,
                    rows.iter().map(|r| r.fcf_share).collect(),
                )
                .secondary(),
            );
        section.chart(chart);

        let mut table = Table::new(
            "Free cash flow",
            ["Year", "Operating cash flow", "Capital expenditure", "Free cash flow", "FCF / OCF"],
        );
        for row in &rows {
            table.push_row([
                row.year.to_string(),
                ValueFormat::MoneyLarge.apply(Some(row.operating_cash_flow)),
                ValueFormat::MoneyLarge.apply(Some(row.capital_expenditure)),
                ValueFormat::MoneyLarge.apply(Some(row.free_cash_flow)),
                ValueFormat::Percent.apply(row.fcf_share),
            ]);
        }
        section.table(table);
    } else {
        for item in missing {
            section.warning(not_found(item));
        }
    }

    section.heading("Debt issuance");
    match cash_flow.get(LineItem::IssuanceOfDebt) {
        Some(issued) => {
            let years: Vec<i32> = issued.keys().copied().collect();
            let mut chart = Chart::new("Debt issuance", year_labels(&years)).with_series(
                Series::bar("Issuance of debt", ValueFormat::MoneyLarge, on_years(&years, issued)),
            );
            if let Some(trend) = linear_trend(issued) {
                chart = chart.with_series(Series::line(
                    "Trend",
                    ValueFormat::MoneyLarge,
                    on_years(&years, &trend.fitted),
                ));
            }
            section.chart(chart);
        }
        None => {
            section.warning(not_found(LineItem::IssuanceOfDebt));
        }
    }

    for (heading, item) in [
        ("Debt repayment", LineItem::RepaymentOfDebt),
        ("Share repurchases", LineItem::RepurchaseOfCapitalStock),
    ] {
        section.heading(heading);
        match cash_flow.get(item) {
            Some(series) => {
                section.chart(year_bars(heading, &[(item.label(), series)], ValueFormat::MoneyLarge));
            }
            None => {
                section.warning(not_found(item));
            }
        }
    }

    section.heading("Cash flow detail");
    section.table(statement_table("Cash flow statement", cash_flow));
    section
}

fn projection_section(data: &Dataset, derived: &Derived) -> Section {
    let v = &derived.valuation;
    let desired = format!("Price for a {:.1}% yield", data.request.desired_yield());
    let entries = [
        ("Current price", data.snapshot.current_price),
        (
            "Geraldine Weiss undervalued price",
            derived.weiss.as_ref().and_then(|w| w.latest_undervalued),
        ),
        ("Book value fair price", v.book_fair_price),
        ("PER price in 5 years", v.projected_price),
        (desired.as_str(), v.dividend_target_price),
    ];

    let mut table = Table::new("Projected valuation", ["Method", "Price"]);
    for (label, value) in &entries {
        table.push_row([label.to_string(), ValueFormat::Money.apply(*value)]);
    }

    let mut section = Section::new("Projected valuation");
    section
        .metrics(
            entries
                .iter()
                .map(|(label, value)| MetricTile::formatted(*label, *value, ValueFormat::Money))
                .collect(),
        )
        .table(table);
    section
}

fn relevant_data_section(data: &Dataset, derived: &Derived) -> Section {
    let snapshot = &data.snapshot;
    let v = &derived.valuation;
    let rows: [(&str, Option<f64>, ValueFormat); 14] = [
        ("ROE", snapshot.return_on_equity, ValueFormat::Percent),
        ("Payout", snapshot.payout_ratio, ValueFormat::Percent),
        ("EPS", snapshot.trailing_eps, ValueFormat::Money),
        ("PER", snapshot.trailing_pe, ValueFormat::Ratio),
        ("P/B", snapshot.price_to_book, ValueFormat::Ratio),
        ("Book value per share", v.book_value_per_share, ValueFormat::Money),
        ("G", v.growth_rate, ValueFormat::Percent),
        ("Growth multiple", v.growth_multiple.map(f64::from), ValueFormat::Count),
        ("EPS in 5 years", v.projected_eps, ValueFormat::Money),
        ("Implied G", v.implied_growth, ValueFormat::Percent),
        ("Annual dividend", snapshot.dividend_rate, ValueFormat::Money),
        ("Current yield", v.current_yield, ValueFormat::Percent),
        ("Dividend CAGR", derived.cagr.map(|c| c.rate), ValueFormat::Percent),
        ("Average yield", derived.yield_stats.map(|s| s.average), ValueFormat::Percent),
    ];

    let mut table = Table::new("Relevant data", ["Metric", "Value"]);
    for (label, value, format) in rows {
        table.push_row([label.to_string(), format.apply(value)]);
    }
    let mut section = Section::new("Relevant data");
    section.table(table);
    section
}
