#![forbid(unsafe_code)]
use chrono::{Datelike, NaiveDate};
use dutypool::{io, run, CsvPrecountStore, DayKind, Document, PrecountStore};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};
use tempfile::tempdir;

const TEAMS: &str = r#"{
    "config": {
        "shuffle": true,
        "retry_on_error": 10,
        "date_gap_size": 0,
        "weekday": { "number_of_standby": 2, "number_of_backup": 1 },
        "weekend": { "number_of_standby": 1, "number_of_backup": 1, "start_group": "C" }
    },
    "period": { "year": 2022, "month": 3 },
    "groups": [
        { "name": "A", "max_available": 2, "members": [
            { "name": "a1", "dayoffs": ["2022-03-10"] },
            { "name": "a2" }, { "name": "a3" }, { "name": "a4" }
        ]},
        { "name": "B", "max_available": 2, "members": [
            { "name": "b1", "vacants": [["2022-03-14", "2022-03-18"]] },
            { "name": "b2" }, { "name": "b3" }, { "name": "b4" }
        ]},
        { "name": "C", "max_available": 1, "members": [
            { "name": "c1" }, { "name": "c2" }, { "name": "c3" }
        ]}
    ]
}"#;

fn reference() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 2, 20).unwrap()
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn month_roster_meets_daily_quotas() {
    let doc = Document::from_json(TEAMS).unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    let run = run(&doc, &[], reference(), &mut rng).unwrap();

    assert_eq!(run.days.len(), 31);
    for day in &run.days {
        let (standby, backup) = match DayKind::of(day.date) {
            DayKind::Weekday => (2, 1),
            DayKind::Weekend => (1, 1),
        };
        assert_eq!(day.standby.len(), standby, "{}", day.date);
        assert_eq!(day.backup.len(), backup, "{}", day.date);

        let everyone: HashSet<_> = day.standby.iter().chain(&day.backup).collect();
        assert_eq!(everyone.len(), standby + backup, "duplicate on {}", day.date);

        if day.date == ymd(2022, 3, 10) {
            assert!(!everyone.contains(&"a1".to_string()));
        }
        if (14..=18).contains(&day.date.day()) {
            assert!(!everyone.contains(&"b1".to_string()));
        }
    }

    // Premier jour de week-end : titulaire issu du groupe C.
    let first_weekend = run.days.iter().find(|d| d.date == ymd(2022, 3, 5)).unwrap();
    assert!(first_weekend.standby[0].starts_with('c'));

    let real: i64 = run.tallies.iter().map(|t| t.real_count).sum();
    assert_eq!(real, 23 * 3 + 8 * 2);
    let per_group: i64 = run.group_tallies.iter().map(|g| g.real_count).sum();
    assert_eq!(per_group, real);
}

#[test]
fn same_seed_same_roster() {
    let doc = Document::from_json(TEAMS).unwrap();
    let a = run(&doc, &[], reference(), &mut StdRng::seed_from_u64(3)).unwrap();
    let b = run(&doc, &[], reference(), &mut StdRng::seed_from_u64(3)).unwrap();
    assert_eq!(a.days, b.days);
}

#[test]
fn gap_keeps_people_apart() {
    let members: Vec<String> = (0..10).map(|i| format!(r#"{{ "name": "p{i}" }}"#)).collect();
    let raw = format!(
        r#"{{
        "config": {{
            "date_gap_size": 1,
            "weekday": {{ "number_of_standby": 2, "number_of_backup": 1 }},
            "weekend": {{ "number_of_standby": 2, "number_of_backup": 1 }}
        }},
        "period": {{ "year": 2022, "month": 3 }},
        "groups": [ {{ "name": "A", "max_available": 10, "members": [{}] }} ]
    }}"#,
        members.join(", ")
    );
    let doc = Document::from_json(&raw).unwrap();
    let run = run(&doc, &[], reference(), &mut StdRng::seed_from_u64(1)).unwrap();
    assert_eq!(run.gap_size, 1);

    let mut seen: HashMap<&str, Vec<NaiveDate>> = HashMap::new();
    for day in &run.days {
        for name in day.standby.iter().chain(&day.backup) {
            seen.entry(name.as_str()).or_default().push(day.date);
        }
    }
    for (name, dates) in &seen {
        for pair in dates.windows(2) {
            let apart = (pair[1] - pair[0]).num_days();
            assert!(apart > 1, "{name} on {} and {}", pair[0], pair[1]);
        }
    }

    let counts: Vec<i64> = run.tallies.iter().map(|t| t.real_count).collect();
    let spread = counts.iter().max().unwrap() - counts.iter().min().unwrap();
    assert!(spread <= 3, "{counts:?}");
}

#[test]
fn carry_over_feeds_next_run() {
    let doc = Document::from_json(TEAMS).unwrap();
    let first = run(&doc, &[], reference(), &mut StdRng::seed_from_u64(5)).unwrap();
    let carry = first.carry_over();
    assert_eq!(carry.len(), doc.people_count());

    let dir = tempdir().unwrap();
    let store = CsvPrecountStore::open(dir.path().join("_precounts.csv"));
    store.save(&carry).unwrap();
    let loaded = store.load().unwrap();
    assert_eq!(loaded, carry);

    let pool = doc
        .build_pool(&loaded, reference(), &mut StdRng::seed_from_u64(6))
        .unwrap();
    for (name, precount) in &loaded {
        let who = pool.find_person(name).unwrap();
        assert_eq!(pool.person(who).unwrap().precount, *precount);
    }
}

#[test]
fn infeasible_quota_gives_up() {
    let raw = r#"{
        "config": {
            "retry_on_error": 2,
            "weekday": { "number_of_standby": 2 },
            "weekend": { "number_of_standby": 2 }
        },
        "period": { "year": 2022, "month": 3 },
        "groups": [ { "name": "A", "max_available": 1, "members": [ { "name": "solo" } ] } ]
    }"#;
    let doc = Document::from_json(raw).unwrap();
    let err = run(&doc, &[], reference(), &mut StdRng::seed_from_u64(0)).unwrap_err();
    assert_eq!(err.to_string(), "not able to make schedule after 2 attempt(s)");
}

#[test]
fn two_day_roster_text() {
    let raw = r#"{
        "config": {
            "date_gap_size": 0,
            "weekday": { "number_of_standby": 1 },
            "weekend": { "number_of_standby": 1 }
        },
        "period": { "year": 2022, "month": 3, "days": ["2022-03-01", "2022-03-02"] },
        "groups": [ { "name": "A", "max_available": 1, "members": [
            { "name": "x" }, { "name": "y" }
        ]} ]
    }"#;
    let doc = Document::from_json(raw).unwrap();
    let run = run(&doc, &[], reference(), &mut StdRng::seed_from_u64(0)).unwrap();
    assert_eq!(run.attempts, 1);

    insta::assert_snapshot!(io::render_text(&run).trim_end(), @r"
2022-03-01 | x
2022-03-02 | y

A: 2
x (A) real=1 pre=0 removed=0 count=1
y (A) real=1 pre=0 removed=0 count=1
");
}
