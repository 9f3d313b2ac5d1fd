#![no_main]

use libfuzzer_sys::fuzz_target;
use lucky::query::{SearchType, parse, pipeline, render};

fuzz_target!(|data: &str| {
    // Parsing arbitrary text must never panic
    let _ = parse(data, SearchType::Regex);

    // A literal-mode query renders to text that parses back to the same tree
    if let Ok(nodes) = parse(data, SearchType::Literal) {
        let rendered = render(&nodes);
        match parse(&rendered, SearchType::Literal) {
            Ok(reparsed) => assert_eq!(reparsed, nodes, "{:?} rendered as {:?}", data, rendered),
            Err(e) => panic!("{:?} rendered as {:?} which fails to parse: {}", data, rendered, e),
        }
    }

    // Every planned Basic survives its own rendering
    if let Ok(plan) = pipeline(data, SearchType::Literal) {
        for basic in &plan {
            let text = basic.to_string();
            let again = pipeline(&text, SearchType::Literal)
                .unwrap_or_else(|e| panic!("{:?} rendered as {:?}: {}", data, text, e));
            assert_eq!(again.basics(), std::slice::from_ref(basic), "{:?}", text);
        }
    }
});
