#![no_main]

use libfuzzer_sys::fuzz_target;
use lucky::job::{DescribeBuilder, JobBuilder, SearchInputs, try_feeling_lucky_job};
use lucky::query::{RuleSet, SearchType, pipeline};

fuzz_target!(|data: &str| {
    // Every query that plans and builds must expand without producing an
    // unbuildable alternative
    let Ok(plan) = pipeline(data, SearchType::Literal) else {
        return;
    };
    let inputs = SearchInputs::new(data, SearchType::Literal);
    if plan.iter().any(|b| DescribeBuilder.basic(&inputs, b).is_err()) {
        return;
    }

    let rules = RuleSet::from_names(&[
        vec!["unquote_patterns"],
        vec!["unquote_patterns", "regexp_patterns"],
    ])
    .unwrap();
    if let Err(e) = try_feeling_lucky_job(&DescribeBuilder, &inputs, &plan, &rules) {
        panic!("{}", e);
    }
});
