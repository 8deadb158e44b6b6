use crate::api::expression::{Field, FieldKind, Resource, Transport};

/// An item of a SharePoint list
///
/// Items live under a parent list, so there is no default collection path;
/// use [`ListItem::items_of`] with `Queryable::at`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListItem;

impl ListItem {
    /// Collection path of the items of the list titled `list_title`
    pub fn items_of(list_title: &str, transport: Transport) -> String {
        match transport {
            Transport::Rest => format!(
                "web/lists/getbytitle('{}')/items",
                list_title.replace('\'', "''")
            ),
            Transport::Graph => {
                format!("sites/root/lists/{}/items", urlencoding::encode(list_title))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListItemField {
    Id,
    Title,
    Created,
    Modified,
    AuthorId,
    FileLeafRef,
    ContentType,
}

impl Field for ListItemField {
    fn name(self) -> &'static str {
        match self {
            ListItemField::Id => "Id",
            ListItemField::Title => "Title",
            ListItemField::Created => "Created",
            ListItemField::Modified => "Modified",
            ListItemField::AuthorId => "AuthorId",
            ListItemField::FileLeafRef => "FileLeafRef",
            ListItemField::ContentType => "ContentType",
        }
    }

    fn kind(self) -> FieldKind {
        match self {
            ListItemField::Id | ListItemField::AuthorId => FieldKind::Integer,
            ListItemField::Title | ListItemField::FileLeafRef => FieldKind::Text,
            ListItemField::Created | ListItemField::Modified => FieldKind::DateTime,
            ListItemField::ContentType => FieldKind::Navigation,
        }
    }

    fn wire_name(self, transport: Transport) -> Option<&'static str> {
        match (transport, self) {
            (Transport::Rest, _) => None,
            (Transport::Graph, ListItemField::Id) => Some("id"),
            (Transport::Graph, ListItemField::Created) => Some("createdDateTime"),
            (Transport::Graph, ListItemField::Modified) => Some("lastModifiedDateTime"),
            (Transport::Graph, ListItemField::ContentType) => Some("contentType"),
            (Transport::Graph, _) => None,
        }
    }

    fn all() -> &'static [Self] {
        &[
            ListItemField::Id,
            ListItemField::Title,
            ListItemField::Created,
            ListItemField::Modified,
            ListItemField::AuthorId,
            ListItemField::FileLeafRef,
            ListItemField::ContentType,
        ]
    }
}

impl Resource for ListItem {
    type Field = ListItemField;

    fn key_field() -> ListItemField {
        ListItemField::Id
    }

    fn resource_path(_transport: Transport) -> Option<&'static str> {
        None
    }
}
