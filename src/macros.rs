/// Constructs a newtype wrapper around a v7 [`uuid::Uuid`]. v7 UUIDs are
/// time-ordered, which keeps the `(aggregate_id, aggregate_version)` btree
/// index locality good under heavy insert load.
#[macro_export]
macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(
            Clone,
            Copy,
            Debug,
            Default,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
            sqlx::Type,
        )]
        #[sqlx(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            pub fn new() -> Self {
                $name(uuid::Uuid::now_v7())
            }

            pub fn into_uuid(self) -> uuid::Uuid {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(uuid: uuid::Uuid) -> Self {
                $name(uuid)
            }
        }

        impl From<$name> for uuid::Uuid {
            fn from(value: $name) -> uuid::Uuid {
                value.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok($name(uuid::Uuid::from_str(s)?))
            }
        }

        impl fake::Dummy<fake::Faker> for $name {
            fn dummy_with_rng<R: fake::Rng + ?Sized>(_config: &fake::Faker, rng: &mut R) -> Self {
                use fake::Fake;
                let uuid: uuid::Uuid = fake::uuid::UUIDv7.fake_with_rng(rng);
                $name(uuid)
            }
        }
    };
}
