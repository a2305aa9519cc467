use super::schema::{
    Dependency, FieldDescriptor, FieldKind, FormSchema, OptionSource, SchemaError, StepDescriptor,
};

pub const COUNTRY_CODES: [&str; 4] = ["+966", "+1", "+44", "+971"];

impl FormSchema {
    /// Bundled property listing form: personal details, property details,
    /// preferences and the review step.
    pub fn property_listing() -> Result<Self, SchemaError> {
        Self::new(vec![
            personal_details(),
            property_details(),
            preferences(),
            StepDescriptor::new("Review & Submit", Vec::new()),
        ])
    }
}

fn personal_details() -> StepDescriptor {
    StepDescriptor::new(
        "Personal Details",
        vec![
            FieldDescriptor::new("firstName", "First Name", FieldKind::Text).required(),
            FieldDescriptor::new("lastName", "Last Name", FieldKind::Text).required(),
            FieldDescriptor::new("email", "Email", FieldKind::Text).required(),
            FieldDescriptor::group(
                "contact",
                "Contact",
                vec![
                    FieldDescriptor::new("countryCode", "Country Code", FieldKind::Select)
                        .required()
                        .with_options(COUNTRY_CODES)
                        .clears(["contact.phone"])
                        .preserving_on_change(),
                    FieldDescriptor::new("phone", "Phone Number", FieldKind::Text).required(),
                ],
            ),
        ],
    )
}

fn property_details() -> StepDescriptor {
    StepDescriptor::new(
        "Property Details",
        vec![
            FieldDescriptor::new("propertyType", "Property Type", FieldKind::Select)
                .required()
                .with_options(["Residential", "Commercial"])
                .clears(["category", "subCategory"]),
            FieldDescriptor::new("category", "Category", FieldKind::Select)
                .required()
                .with_option_source(OptionSource::new(
                    "propertyType",
                    [
                        ("Residential", vec!["Apartment", "Villa", "Townhouse"]),
                        ("Commercial", vec!["Office", "Retail", "Warehouse"]),
                    ],
                ))
                .depends_on(Dependency::not_empty("propertyType"))
                .clears(["subCategory"]),
            FieldDescriptor::new("subCategory", "Sub Category", FieldKind::Select)
                .required()
                .with_option_source(OptionSource::new(
                    "category",
                    [
                        ("Apartment", vec!["Studio", "One Bedroom", "Two Bedroom"]),
                        ("Villa", vec!["Standalone", "Compound"]),
                        ("Office", vec!["Open Plan", "Serviced"]),
                    ],
                ))
                .depends_on(Dependency::not_empty("category")),
            FieldDescriptor::new("price", "Price", FieldKind::Number).required(),
            FieldDescriptor::new("hasParking", "Has Parking", FieldKind::Checkbox)
                .clears(["parkingSpaces"]),
            FieldDescriptor::new("parkingSpaces", "Parking Spaces", FieldKind::Number)
                .required()
                .depends_on(Dependency::equals("hasParking", true)),
            FieldDescriptor::new("listingType", "Listing Type", FieldKind::Radio)
                .required()
                .with_options(["Sale", "Rent"]),
        ],
    )
}

fn preferences() -> StepDescriptor {
    StepDescriptor::new(
        "Preferences",
        vec![
            FieldDescriptor::new("date", "Preferred Move-in Date", FieldKind::Date).required(),
            FieldDescriptor::new("newsletter", "Subscribe to Newsletter", FieldKind::Checkbox),
            FieldDescriptor::new("agreeToTerms", "I agree to the terms", FieldKind::Checkbox)
                .required(),
        ],
    )
}
