//! Helper macro for declaring port error enums with snake_case constructors.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum QueueProbeError {
            Offline => "queue offline",
            Rejected { message: String } => "rejected: {message}",
            Busy { attempts: u32 } => "busy after {attempts} attempts",
            Service { code: String, message: String } => "{code}: {message}",
        }
    }

    #[test]
    fn unit_variants_get_zero_argument_constructors() {
        assert_eq!(QueueProbeError::offline().to_string(), "queue offline");
    }

    #[test]
    fn string_fields_accept_borrowed_text() {
        let err = QueueProbeError::rejected("bad receipt");
        assert_eq!(err.to_string(), "rejected: bad receipt");
    }

    #[test]
    fn non_string_fields_keep_their_type() {
        assert_eq!(QueueProbeError::busy(3_u32).to_string(), "busy after 3 attempts");
    }

    #[test]
    fn multiple_fields_are_taken_in_declaration_order() {
        let err = QueueProbeError::service("AccessDenied", "nope");
        assert_eq!(
            err,
            QueueProbeError::Service {
                code: "AccessDenied".to_owned(),
                message: "nope".to_owned(),
            }
        );
    }
}
