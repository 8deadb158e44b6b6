use crate::api::expression::{Field, FieldKind, Resource, Transport};

/// A SharePoint list (`web/lists` on REST, `sites/root/lists` on Graph)
#[derive(Debug, Clone, Copy, Default)]
pub struct List;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListField {
    Id,
    Title,
    Description,
    TemplateType,
    Hidden,
    Created,
    AuthorId,
    Items,
    RootFolder,
}

impl Field for ListField {
    fn name(self) -> &'static str {
        match self {
            ListField::Id => "Id",
            ListField::Title => "Title",
            ListField::Description => "Description",
            ListField::TemplateType => "TemplateType",
            ListField::Hidden => "Hidden",
            ListField::Created => "Created",
            ListField::AuthorId => "AuthorID",
            ListField::Items => "Items",
            ListField::RootFolder => "RootFolder",
        }
    }

    fn kind(self) -> FieldKind {
        match self {
            ListField::Id => FieldKind::Guid,
            ListField::Title | ListField::Description => FieldKind::Text,
            ListField::TemplateType | ListField::AuthorId => FieldKind::Integer,
            ListField::Hidden => FieldKind::Boolean,
            ListField::Created => FieldKind::DateTime,
            ListField::Items | ListField::RootFolder => FieldKind::Navigation,
        }
    }

    fn wire_name(self, transport: Transport) -> Option<&'static str> {
        match (transport, self) {
            (Transport::Rest, ListField::TemplateType) => Some("BaseTemplate"),
            (Transport::Rest, _) => None,
            (Transport::Graph, ListField::Id) => Some("sharepointIds"),
            (Transport::Graph, ListField::Title) => Some("displayName"),
            (Transport::Graph, ListField::Description) => Some("description"),
            (Transport::Graph, ListField::Created) => Some("createdDateTime"),
            (Transport::Graph, ListField::Items) => Some("items"),
            (Transport::Graph, ListField::RootFolder) => Some("drive"),
            (Transport::Graph, _) => None,
        }
    }

    fn all() -> &'static [Self] {
        &[
            ListField::Id,
            ListField::Title,
            ListField::Description,
            ListField::TemplateType,
            ListField::Hidden,
            ListField::Created,
            ListField::AuthorId,
            ListField::Items,
            ListField::RootFolder,
        ]
    }
}

impl Resource for List {
    type Field = ListField;

    fn key_field() -> ListField {
        ListField::Id
    }

    fn resource_path(transport: Transport) -> Option<&'static str> {
        match transport {
            Transport::Rest => Some("web/lists"),
            Transport::Graph => Some("sites/root/lists"),
        }
    }
}
