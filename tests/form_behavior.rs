use page_state_tester::{Error, Harness, SAMPLE_PAGE_HTML};

fn assert_visibility_matrix(
    harness: &Harness,
    seed: &str,
    stop: &str,
    package: &str,
) -> page_state_tester::Result<()> {
    harness.assert_visibility("#seedGroup", seed)?;
    harness.assert_visibility("#stopGroup", stop)?;
    harness.assert_visibility("#packageGroup", package)?;
    Ok(())
}

#[test]
fn algorithm_one_hides_all_dependent_groups() -> page_state_tester::Result<()> {
    let mut harness = Harness::from_html(SAMPLE_PAGE_HTML)?;

    harness.select_value("#algorithm", "3")?;
    harness.select_value("#algorithm", "1")?;
    assert_visibility_matrix(&harness, "hidden", "hidden", "hidden")?;
    Ok(())
}

#[test]
fn algorithm_two_reveals_seed_and_stop_groups() -> page_state_tester::Result<()> {
    let mut harness = Harness::from_html(SAMPLE_PAGE_HTML)?;

    harness.select_value("#algorithm", "2")?;
    assert_visibility_matrix(&harness, "visible", "visible", "hidden")?;
    Ok(())
}

#[test]
fn algorithm_three_reveals_all_three_groups() -> page_state_tester::Result<()> {
    let mut harness = Harness::from_html(SAMPLE_PAGE_HTML)?;

    harness.select_value("#algorithm", "3")?;
    assert_visibility_matrix(&harness, "visible", "visible", "visible")?;
    Ok(())
}

#[test]
fn unknown_algorithm_value_hides_everything() -> page_state_tester::Result<()> {
    let mut harness = Harness::from_html(SAMPLE_PAGE_HTML)?;

    harness.select_value("#algorithm", "3")?;
    harness.select_value("#algorithm", "9")?;

    harness.assert_value("#algorithm", "")?;
    assert_visibility_matrix(&harness, "hidden", "hidden", "hidden")?;
    Ok(())
}

#[test]
fn submitting_with_a_checked_radio_raises_one_alert() -> page_state_tester::Result<()> {
    let mut harness = Harness::from_html(SAMPLE_PAGE_HTML)?;

    harness.set_checked("#option-accurate", true)?;
    harness.submit("#radio-btn")?;

    assert_eq!(harness.take_alerts(), vec!["You selected: accurate"]);
    Ok(())
}

#[test]
fn clicking_the_submit_button_submits_the_radio_form() -> page_state_tester::Result<()> {
    let mut harness = Harness::from_html(SAMPLE_PAGE_HTML)?;

    harness.click("#option-fast")?;
    harness.assert_checked("#option-fast", true)?;
    harness.click("#btn-submit-options")?;

    assert_eq!(harness.take_alerts(), vec!["You selected: fast"]);
    Ok(())
}

#[test]
fn submitting_without_a_checked_radio_faults_but_leaves_the_page_usable() {
    let mut harness = Harness::from_html(SAMPLE_PAGE_HTML).unwrap();

    let err = harness.submit("#radio-btn").unwrap_err();
    assert!(matches!(err, Error::HandlerFault(_)));
    assert!(harness.take_alerts().is_empty());

    // The fault halts only that handler invocation.
    harness.set_checked("#option-balanced", true).unwrap();
    harness.submit("#radio-btn").unwrap();
    assert_eq!(harness.take_alerts(), vec!["You selected: balanced"]);
}

#[test]
fn checking_one_radio_unchecks_the_rest_of_the_group() -> page_state_tester::Result<()> {
    let mut harness = Harness::from_html(SAMPLE_PAGE_HTML)?;

    harness.set_checked("#option-fast", true)?;
    harness.set_checked("#option-accurate", true)?;

    harness.assert_checked("#option-fast", false)?;
    harness.assert_checked("#option-accurate", true)?;
    harness.assert_checked("#option-balanced", false)?;
    Ok(())
}

#[test]
fn visibility_depends_only_on_the_current_selection() -> page_state_tester::Result<()> {
    let mut harness = Harness::from_html(SAMPLE_PAGE_HTML)?;

    for (value, seed, package) in [
        ("2", "visible", "hidden"),
        ("3", "visible", "visible"),
        ("2", "visible", "hidden"),
        ("1", "hidden", "hidden"),
    ] {
        harness.select_value("#algorithm", value)?;
        harness.assert_value("#algorithm", value)?;
        harness.assert_visibility("#seedGroup", seed)?;
        harness.assert_visibility("#packageGroup", package)?;
    }
    Ok(())
}
