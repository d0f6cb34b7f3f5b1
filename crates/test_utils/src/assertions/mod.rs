//! Assertion utilities for testing

/// Assert that a result is OK and unwrap it
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(err) => panic!("Expected Ok, got Err: {:?}", err),
        }
    };
    ($expr:expr, $($arg:tt)+) => {
        match $expr {
            Ok(val) => val,
            Err(err) => panic!("Expected Ok, got Err: {:?} ({})", err, format!($($arg)+)),
        }
    };
}

/// Assert that a result is Err and unwrap the error
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(val) => panic!("Expected Err, got Ok: {:?}", val),
            Err(err) => err,
        }
    };
    ($expr:expr, $($arg:tt)+) => {
        match $expr {
            Ok(val) => panic!("Expected Err, got Ok: {:?} ({})", val, format!($($arg)+)),
            Err(err) => err,
        }
    };
}

/// Assert that `child` carries a controller owner reference to `owner`.
#[macro_export]
macro_rules! assert_controlled_by {
    ($child:expr, $owner:expr) => {{
        use $crate::__kube::Resource as _;
        let owner_uid = $owner.meta().uid.clone();
        let refs = $child.meta().owner_references.clone().unwrap_or_default();
        assert!(
            refs.iter()
                .any(|r| Some(&r.uid) == owner_uid.as_ref() && r.controller == Some(true)),
            "{:?} is not controlled by {:?}",
            $child.meta().name,
            $owner.meta().name
        );
    }};
}
