use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

mod common;

fn paycost() -> Command {
    let mut cmd = Command::new(cargo_bin!("paycost"));
    cmd.env_remove("PAYCOST_CATALOG").env_remove("PAYCOST_LOG");
    cmd
}

#[test]
fn test_fee_applies_minimum() {
    paycost()
        .args(["fee", "100", "swift"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "channel_id,channel_name,amount,rate,fixed_fee,calculated_fee,adjustment,final_fee,note",
        ))
        .stdout(predicate::str::contains(
            "swift,SWIFT Remittance,100.00,0.0150,30.00,31.50,0.00,80.00,minimum fee applied",
        ));
}

#[test]
fn test_fee_flat_ignores_tiers() {
    // 20000 sits in the 0.012 tier; flat pricing uses the 0.015 base rate.
    paycost()
        .args(["fee", "20000", "bank_transfer", "--flat"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "bank_transfer,Bank Wire Transfer,20000.00,0.0150,50.00,350.00,0.00,350.00,",
        ));
}

#[test]
fn test_fee_rejects_unknown_and_inactive_channels() {
    paycost()
        .args(["fee", "100", "carrier_pigeon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown channel: carrier_pigeon"));

    paycost()
        .args(["fee", "100", "western_union"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Inactive channel: western_union"));
}

#[test]
fn test_invalid_amount_fails_fast() {
    paycost()
        .args(["fee", "lots", "swift"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid amount"));
}

#[test]
fn test_extreme_amounts_are_rejected_not_panics() {
    for command in ["compare", "cheapest", "exchange"] {
        for amount in ["79228162514264337593543950335", "0.0000000000000000000000000001"] {
            paycost()
                .args([command, amount, "USD"])
                .assert()
                .failure()
                .code(1)
                .stderr(predicate::str::contains("Invalid amount"));
        }
    }

    paycost()
        .args(["fee", "79228162514264337593543950335", "wise"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid amount"));
}

#[test]
fn test_exchange_row() {
    paycost()
        .args(["exchange", "1000", "usd"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "USD,CNY,1000.00,7.25,7.21375,7250.00,7213.75,36.25,0.50",
        ));
}

#[test]
fn test_unsupported_currency_lists_alternatives() {
    paycost()
        .args(["compare", "1000", "XYZ"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported currency"))
        .stderr(predicate::str::contains("Supported currencies"));
}

#[test]
fn test_compare_ranks_wise_first_for_usd() {
    paycost()
        .args(["compare", "1000", "USD"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "rank,channel_id,channel_name,fee,exchange_loss,total_cost,total_cost_rate",
        ))
        .stdout(predicate::str::contains("1,wise,Wise,11.00,36.25,115.60,0.0160"))
        .stdout(predicate::str::contains("western_union").not());
}

#[test]
fn test_compare_restricted_channel_list() {
    paycost()
        .args(["compare", "1000", "USD", "--channels", "swift,nope"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1,swift,SWIFT Remittance,80.00,36.25,613.35,0.0850"))
        .stdout(predicate::str::contains("wise").not());
}

#[test]
fn test_cheapest_line() {
    paycost()
        .args(["cheapest", "1000", "USD"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Wise (wise): total cost ¥115.60 (1.60%), fee $11.00",
        ));
}

#[test]
fn test_cheapest_with_observed_ledger() {
    paycost()
        .args(["cheapest", "1000", "USD", "--ledger", "tests/fixtures/ledger.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wise (wise)"))
        .stdout(predicate::str::contains(
            "Observed: swift at 8.00% over 1 similar transfers, estimated fee $80.00",
        ));

    paycost()
        .args(["cheapest", "100", "GBP", "--ledger", "tests/fixtures/ledger.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Observed: no similar transfers in GBP"));
}

#[test]
fn test_cheapest_not_found() {
    paycost()
        .args(["cheapest", "1000", "CNY"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no active channel supports CNY"));
}

#[test]
fn test_spread_override() {
    paycost()
        .args(["--spread", "0.01", "exchange", "100", "USD"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "USD,CNY,100.00,7.25,7.1775,725.00,717.75,7.25,1.00",
        ));

    paycost()
        .args(["--spread", "1.5", "exchange", "100", "USD"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid rate"));

    for spread in ["-0.1", "wide"] {
        paycost()
            .args(["--spread", spread, "exchange", "100", "USD"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid rate"));
    }
}

#[test]
fn test_channels_listing() {
    paycost()
        .arg("channels")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "id,name,kind,base_rate,fixed_fee,tiers,currencies,active,processing_days",
        ))
        .stdout(predicate::str::contains("bank_transfer,Bank Wire Transfer,bank,"))
        .stdout(predicate::str::is_match(r"swift,SWIFT Remittance,bank,.*,true,5\n").unwrap())
        .stdout(predicate::str::is_match(r"western_union,Western Union,other,0.03,15.00,0,.*,false,1").unwrap());
}

#[test]
fn test_custom_catalog() {
    paycost()
        .args(["--catalog", "tests/fixtures/catalog.json", "fee", "500", "wire"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "wire,Wire,500.00,0.0200,2.00,12.00,0.00,12.00,",
        ));

    paycost()
        .env("PAYCOST_CATALOG", "tests/fixtures/catalog.json")
        .args(["exchange", "100", "USD"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "USD,CNY,100.00,7.00,6.93,700.00,693.00,7.00,1.00",
        ));
}

#[test]
fn test_missing_catalog_file() {
    paycost()
        .args(["--catalog", "tests/fixtures/absent.json", "channels"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("IO error"));
}

#[test]
fn test_analyze_skips_malformed_rows() {
    paycost()
        .args(["analyze", "tests/fixtures/ledger.csv"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Error reading transaction"))
        .stdout(predicate::str::contains("metric,value"))
        .stdout(predicate::str::contains("total_transactions,3"))
        .stdout(predicate::str::contains("total_amount,3500.00"))
        .stdout(predicate::str::contains("success_rate,0.6667"))
        .stdout(predicate::str::contains("status:failed,1"));
}

#[test]
fn test_analyze_reports() {
    paycost()
        .args(["analyze", "tests/fixtures/ledger.csv", "--report", "channel"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "swift,SWIFT Remittance,1,1000.00,1000.00,80.00,80.00,7250.00,0.0800",
        ));

    paycost()
        .args(["analyze", "tests/fixtures/ledger.csv", "--report", "volume"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1,wise,Wise,2000.00,1"));

    paycost()
        .args(["analyze", "tests/fixtures/ledger.csv", "--report", "percentiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("amount,p50,1000.00"));

    paycost()
        .args(["analyze", "tests/fixtures/ledger.csv", "--report", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("amount:mean,1166.67"))
        .stdout(predicate::str::contains("fee:max,80.00"));
}

#[test]
fn test_analyze_filters() {
    paycost()
        .args(["analyze", "tests/fixtures/ledger.csv", "--status", "failed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("total_transactions,1"));

    paycost()
        .args(["analyze", "tests/fixtures/ledger.csv", "--currency", "usd", "--channel", "wise"])
        .assert()
        .success()
        .stdout(predicate::str::contains("total_amount,2000.00"));
}

#[test]
fn test_analyze_date_and_amount_filters() {
    paycost()
        .args(["analyze", "tests/fixtures/ledger.csv", "--from", "2024-03-02", "--to", "2024-03-03"])
        .assert()
        .success()
        .stdout(predicate::str::contains("total_transactions,1"))
        .stdout(predicate::str::contains("total_amount,2000.00"));

    paycost()
        .args([
            "analyze",
            "tests/fixtures/ledger.csv",
            "--min-amount",
            "600",
            "--max-amount",
            "1500",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("total_transactions,1"))
        .stdout(predicate::str::contains("total_amount,1000.00"));

    paycost()
        .args(["analyze", "tests/fixtures/ledger.csv", "--from", "March"])
        .assert()
        .failure();
}

#[test]
fn test_analyze_fee_comparison_report() {
    paycost()
        .args(["analyze", "tests/fixtures/ledger.csv", "--report", "fee-comparison"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "channel_id,channel_name,channel_type,transaction_count,total_amount,total_fee,avg_fee,avg_fee_rate,fee_share",
        ))
        .stdout(predicate::str::contains("wise,Wise,other,1,2000.00,17.00,17.00,0.0085,0.1425"))
        .stdout(predicate::str::is_match(r"(?s)\nwise,.*\npaypal,.*\nswift,").unwrap());
}

#[test]
fn test_analyze_pivot_and_fee_matrix_reports() {
    paycost()
        .args(["analyze", "tests/fixtures/ledger.csv", "--report", "pivot"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "channel_id,EUR,USD,total\n\
             paypal,500.00,0.00,500.00\n\
             swift,0.00,1000.00,1000.00\n\
             wise,0.00,2000.00,2000.00\n\
             total,500.00,3000.00,3500.00\n",
        ));

    paycost()
        .args(["analyze", "tests/fixtures/ledger.csv", "--report", "fee-matrix"])
        .assert()
        .success()
        .stdout(predicate::str::contains("channel_id,EUR,USD\n"))
        .stdout(predicate::str::contains("paypal,0.0446,\n"))
        .stdout(predicate::str::contains("swift,,0.0800\n"));
}

#[test]
fn test_analyze_top_transactions_report() {
    paycost()
        .args(["analyze", "tests/fixtures/ledger.csv", "--report", "top", "--top", "2", "--by", "fee"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "id,amount,currency,channel,fee,fee_rate,amount_ref,status,date\n\
             t1,1000,USD,swift,80,0.08,7250,completed,2024-03-01\n\
             t4,500,EUR,paypal,22.3,0.0446,3925,failed,2024-03-04\n",
        ))
        .stdout(predicate::str::contains("t2,").not());

    paycost()
        .args(["analyze", "tests/fixtures/ledger.csv", "--report", "top", "--top", "1", "--ascending"])
        .assert()
        .success()
        .stdout(predicate::str::contains("t4,500,EUR"))
        .stdout(predicate::str::contains("t1,").not());
}

#[test]
fn test_analyze_generated_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.csv");
    common::generate_ledger(&path, 500, 7).expect("Failed to generate ledger");

    paycost()
        .arg("analyze")
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("Error reading transaction").not())
        .stdout(predicate::str::contains("total_transactions,500"));

    paycost()
        .arg("analyze")
        .arg(&path)
        .args(["--report", "currency"])
        .assert()
        .success()
        .stdout(predicate::str::contains("currency,exchange_rate,transaction_count"));
}
