// tests for the sql guard

use cliniq::{Error, Guard};

#[test]
fn plain_predicate_passes() {
    assert!(Guard::check_fragment("appointment_date >= '2025-01-01' AND name = 'Jae'").is_ok());
}

#[test]
fn order_by_passes() {
    assert!(Guard::check_fragment("appointment_date DESC, start_hour").is_ok());
}

#[test]
fn keyword_inside_column_name_passes() {
    // updated_at contains UPDATE as a substring, which is fine
    assert!(Guard::check_fragment("updated_at > '2025-06-01'").is_ok());
}

#[test]
fn semicolon_is_rejected() {
    assert!(matches!(
        Guard::check_fragment("1=1; DROP TABLE agenda"),
        Err(Error::BadRequest(_))
    ));
}

#[test]
fn comment_is_rejected() {
    assert!(Guard::check_fragment("1=1 -- hide the rest").is_err());
    assert!(Guard::check_fragment("1=1 /* hidden */").is_err());
}

#[test]
fn drop_keyword_is_rejected() {
    assert!(Guard::check_fragment("name = 'x' OR drop table agenda").is_err());
}

#[test]
fn delete_keyword_is_rejected() {
    let err = Guard::check_fragment("DELETE FROM agenda").unwrap_err();
    assert!(err.to_string().contains("DELETE"));
}

#[test]
fn update_and_insert_are_rejected() {
    assert!(Guard::check_fragment("update agenda set id = 1").is_err());
    assert!(Guard::check_fragment("insert into agenda values (1)").is_err());
}

#[test]
fn quote_ident_wraps_plain_names() {
    assert_eq!(Guard::quote_ident("patients").unwrap(), "\"patients\"");
    assert_eq!(Guard::quote_ident("start_hour").unwrap(), "\"start_hour\"");
}

#[test]
fn quote_ident_rejects_embedded_quote() {
    assert!(Guard::quote_ident("agenda\" --").is_err());
}

#[test]
fn quote_ident_rejects_empty() {
    assert!(Guard::quote_ident("").is_err());
}
